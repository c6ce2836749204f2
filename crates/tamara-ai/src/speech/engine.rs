//! HTTP speech synthesis client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chunker::clean_for_speech;
use crate::AiError;

use super::SpeechSynthesizer;

/// Voice used when the configured one is not offered by the server.
pub const FALLBACK_VOICE: &str = "ef_dora";

/// Speech server settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechSettings {
    pub base_url: String,
    pub model: String,
    pub voice: String,
    pub speed: f64,
    pub language: String,
    pub response_format: String,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8880".into(),
            model: "kokoro".into(),
            voice: FALLBACK_VOICE.into(),
            speed: 1.1,
            language: "es".into(),
            response_format: "wav".into(),
        }
    }
}

impl SpeechSettings {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    pub(crate) fn request_body(&self, input: &str) -> Value {
        json!({
            "model": self.model,
            "input": input,
            "voice": self.voice,
            "speed": self.speed,
            "response_format": self.response_format,
            "lang_code": self.language,
        })
    }
}

/// Speech synthesis client with an observable readiness flag.
pub struct SpeechEngine {
    http: reqwest::Client,
    settings: RwLock<SpeechSettings>,
    voices: RwLock<Vec<String>>,
    ready: AtomicBool,
}

impl SpeechEngine {
    pub fn new(settings: SpeechSettings) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AiError::NetworkError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            settings: RwLock::new(settings),
            voices: RwLock::new(Vec::new()),
            ready: AtomicBool::new(false),
        })
    }

    /// Run [`initialize`](Self::initialize) in the background.
    pub fn spawn_initialize(self: &Arc<Self>) -> JoinHandle<bool> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.initialize().await })
    }

    /// Probe the server's voice list and mark the engine ready.
    ///
    /// Falls back to [`FALLBACK_VOICE`] when the configured voice is not
    /// listed. Returns the resulting readiness.
    pub async fn initialize(&self) -> bool {
        if self.is_ready() {
            return true;
        }

        let url = self.settings.read().await.url("/v1/audio/voices");
        let voices = match self.fetch_voices(&url).await {
            Ok(voices) => voices,
            Err(e) => {
                warn!(error = %e, "speech engine unavailable, continuing without audio");
                return false;
            }
        };

        {
            let mut settings = self.settings.write().await;
            if !voices.is_empty() && !voices.contains(&settings.voice) {
                warn!(voice = %settings.voice, fallback = FALLBACK_VOICE, "voice not found");
                settings.voice = FALLBACK_VOICE.to_string();
            }
            info!(voice = %settings.voice, voices = voices.len(), "speech engine ready");
        }

        *self.voices.write().await = voices;
        self.ready.store(true, Ordering::Release);
        true
    }

    async fn fetch_voices(&self, url: &str) -> Result<Vec<String>, AiError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AiError::NetworkError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AiError::ApiError(format!("HTTP {}", response.status())));
        }
        let json: Value = response
            .json()
            .await
            .map_err(|e| AiError::ParseError(e.to_string()))?;
        Ok(parse_voices(&json))
    }

    async fn request_audio(&self, text: &str) -> Result<Vec<u8>, AiError> {
        let (url, body) = {
            let settings = self.settings.read().await;
            (settings.url("/v1/audio/speech"), settings.request_body(text))
        };

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = text.chars().take(200).collect::<String>();
            return Err(AiError::ApiError(format!("HTTP {status}: {text}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AiError::NetworkError(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Switch voice. Fails when not ready or the server does not offer it.
    pub async fn set_voice(&self, voice: &str) -> bool {
        if !self.is_ready() {
            return false;
        }
        let voices = self.voices.read().await;
        if !voices.is_empty() && !voices.iter().any(|v| v == voice) {
            warn!(%voice, "voice not available");
            return false;
        }
        self.settings.write().await.voice = voice.to_string();
        info!(%voice, "voice changed");
        true
    }

    /// Set the speed factor, clamped to 0.5..=2.0.
    pub async fn set_speed(&self, speed: f64) -> f64 {
        let speed = clamp_speed(speed);
        self.settings.write().await.speed = speed;
        debug!(speed, "speech speed adjusted");
        speed
    }

    pub async fn settings(&self) -> SpeechSettings {
        self.settings.read().await.clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for SpeechEngine {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    async fn synthesize(&self, text: &str) -> Option<Vec<u8>> {
        if !self.is_ready() {
            debug!("speech engine not ready, skipping audio");
            return None;
        }
        let text = clean_for_speech(text)?;
        match self.request_audio(&text).await {
            Ok(audio) if !audio.is_empty() => Some(audio),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "speech synthesis failed");
                None
            }
        }
    }
}

fn clamp_speed(speed: f64) -> f64 {
    if speed.is_nan() {
        1.0
    } else {
        speed.clamp(0.5, 2.0)
    }
}

/// Accepts `{"voices": [...]}` or a bare array, of names or `{id|name}`.
fn parse_voices(json: &Value) -> Vec<String> {
    let list = json
        .get("voices")
        .and_then(Value::as_array)
        .or_else(|| json.as_array());
    list.map(|items| {
        items
            .iter()
            .filter_map(|v| {
                v.as_str()
                    .or_else(|| v.get("id").and_then(Value::as_str))
                    .or_else(|| v.get("name").and_then(Value::as_str))
                    .map(String::from)
            })
            .collect()
    })
    .unwrap_or_default()
}
