//! Full configuration validation.
//!
//! Each section has its own check; this orchestrator calls them all and
//! collects errors into a single `ConfigError`.

mod helpers;
mod sections;


use crate::schema::TamaraConfig;
use tamara_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &TamaraConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    sections::validate_llm(&mut errors, config);
    sections::validate_speech(&mut errors, config);
    sections::validate_server(&mut errors, config);
    sections::validate_database(&mut errors, config);
    sections::validate_tools(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
