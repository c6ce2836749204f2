//! Environment variable overrides for deployment secrets and hosts.

use tracing::{debug, warn};

use crate::schema::TamaraConfig;

/// Apply `TAMARA_*` / `OLLAMA_HOST` overrides from the process environment.
pub fn apply_env_overrides(config: &mut TamaraConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides using an arbitrary variable lookup.
pub fn apply_overrides_from(config: &mut TamaraConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(model) = get("TAMARA_LLM_MODEL") {
        debug!(%model, "llm.model overridden from environment");
        config.llm.model = model;
    }
    if let Some(host) = get("OLLAMA_HOST") {
        config.llm.base_url = normalize_ollama_host(&host);
    }

    let db = &mut config.database;
    if let Some(host) = get("TAMARA_DB_HOST") {
        db.host = host;
    }
    if let Some(port) = get("TAMARA_DB_PORT") {
        match port.parse() {
            Ok(p) => db.port = p,
            Err(_) => warn!(%port, "ignoring invalid TAMARA_DB_PORT"),
        }
    }
    if let Some(user) = get("TAMARA_DB_USER") {
        db.user = user;
    }
    if let Some(password) = get("TAMARA_DB_PASSWORD") {
        db.password = password;
    }
    if let Some(name) = get("TAMARA_DB_NAME") {
        db.database = name;
    }
    if let Some(value) = get("TAMARA_DB_ALLOW_WRITE") {
        match parse_bool(&value) {
            Some(b) => db.allow_write = b,
            None => warn!(%value, "ignoring invalid TAMARA_DB_ALLOW_WRITE"),
        }
    }
}

/// Parse the boolean spellings accepted in environment variables.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// OLLAMA_HOST is often given as bare `host:port`.
fn normalize_ollama_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}
