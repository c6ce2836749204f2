//! Language model settings.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are TAMARA, an intelligent voice assistant with access to tools. \
Respond in Spanish in a conversational and brief manner. \
You have access to a MariaDB database. When the user asks about data, \
use the available tools to query the database. \
First list the tables, then describe their structure if necessary, \
and finally execute the appropriate query. \
Maximum 50 words per response.";

/// Model backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model name as known to the Ollama server.
    pub model: String,
    /// Base URL of the Ollama server.
    pub base_url: String,
    /// Maximum number of history messages, system directive included (valid range: 2-10000).
    pub max_history: u32,
    pub system_prompt: String,
    /// Bound on each model request and each streamed read, in seconds (valid range: 1-3600).
    pub request_timeout_secs: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-oss:20b".into(),
            base_url: "http://localhost:11434".into(),
            max_history: 500,
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            request_timeout_secs: 120,
        }
    }
}
