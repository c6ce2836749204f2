//! Tool calling settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub enabled: bool,
    /// Names of the tools to register.
    pub available: Vec<String>,
    /// Bound on a single tool invocation, in seconds (valid range: 1-600).
    pub timeout_secs: u32,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            available: vec![
                "list_database_tables".into(),
                "describe_table".into(),
                "query_database".into(),
                "get_table_count".into(),
            ],
            timeout_secs: 30,
        }
    }
}
