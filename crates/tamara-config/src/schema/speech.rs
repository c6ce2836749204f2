//! Speech synthesis settings.

use serde::{Deserialize, Serialize};

/// Text-to-speech backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible speech server (e.g. Kokoro).
    pub base_url: String,
    pub model: String,
    pub voice: String,
    /// Speed factor (valid range: 0.5-2.0).
    pub speed: f64,
    pub language: String,
    pub response_format: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:8880".into(),
            model: "kokoro".into(),
            voice: "ef_dora".into(),
            speed: 1.1,
            language: "es".into(),
            response_format: "wav".into(),
        }
    }
}
