//! Tamara configuration system.
//!
//! TOML-based configuration with environment overrides and full
//! validation. All config sections use sensible defaults so partial configs
//! work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tamara_config::{config_to_json, load_config};
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::TamaraConfig;

use std::path::Path;

use tamara_common::ConfigError;

/// Load config from `explicit` or the search path, apply environment
/// overrides, and validate the result.
pub fn load_config(explicit: Option<&Path>) -> Result<TamaraConfig, ConfigError> {
    toml_loader::load(explicit)
}

/// Serialize a config to pretty-printed JSON with secrets masked.
pub fn config_to_json(config: &TamaraConfig) -> String {
    let mut masked = config.clone();
    if !masked.database.password.is_empty() {
        masked.database.password = "[REDACTED]".into();
    }
    serde_json::to_string_pretty(&masked)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
