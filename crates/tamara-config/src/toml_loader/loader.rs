//! Core TOML config loading: read from an explicit path or the search path.

use crate::env::apply_env_overrides;
use crate::schema::TamaraConfig;
use crate::validation;
use std::path::Path;
use tamara_common::ConfigError;
use tracing::{info, warn};

use super::paths::resolve_config_path;

/// Load config from a specific TOML file path.
///
/// Deserializes the file using serde defaults for any missing fields.
/// Environment overrides and validation are applied by [`load`], not here.
pub fn load_from_path(path: &Path) -> Result<TamaraConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: TamaraConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Resolve, load, override from the environment, and validate.
///
/// With no explicit path and no config file on the search path, the
/// defaults are used. An explicit path that does not exist is an error.
pub fn load(explicit: Option<&Path>) -> Result<TamaraConfig, ConfigError> {
    let mut config = match resolve_config_path(explicit) {
        Some(path) => load_from_path(&path)?,
        None => {
            warn!("no config file found, using defaults");
            TamaraConfig::default()
        }
    };

    apply_env_overrides(&mut config);
    validation::validate(&config)?;
    Ok(config)
}
