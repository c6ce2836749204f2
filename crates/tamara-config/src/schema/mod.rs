//! Configuration schema types for Tamara.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults the assistant ships with.

mod database;
mod llm;
mod server;
mod speech;
mod tools;

pub use database::*;
pub use llm::*;
pub use server::*;
pub use speech::*;
pub use tools::*;

use serde::{Deserialize, Serialize};

/// Root configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TamaraConfig {
    pub llm: LlmConfig,
    pub tts: SpeechConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub tools: ToolsConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_assistant() {
        let config = TamaraConfig::default();
        assert_eq!(config.llm.model, "gpt-oss:20b");
        assert_eq!(config.llm.max_history, 500);
        assert_eq!(config.tts.voice, "ef_dora");
        assert_eq!(config.server.port, 8000);
        assert!(!config.database.enabled);
        assert!(!config.database.allow_write);
        assert!(config.tools.enabled);
        assert_eq!(config.tools.available.len(), 4);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config: TamaraConfig = toml::from_str("").unwrap();
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.tts.response_format, "wav");
    }

    #[test]
    fn log_level_parses_lowercase() {
        let config: TamaraConfig = toml::from_str("[server]\nlog_level = \"debug\"\n").unwrap();
        assert_eq!(config.server.log_level, LogLevel::Debug);
        assert_eq!(config.server.log_level.as_directive(), "debug");
    }
}
