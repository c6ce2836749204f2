//! Text-to-speech.
//!
//! [`SpeechEngine`] talks to an OpenAI-compatible speech server such as
//! Kokoro-FastAPI. It starts not ready; a one-shot initialization task
//! probes the server and flips the readiness flag. Until then, and after any
//! failure, `synthesize` yields nothing and the conversation simply goes on
//! without audio.

mod engine;

pub use engine::{SpeechEngine, SpeechSettings, FALLBACK_VOICE};

use async_trait::async_trait;

/// Something that can turn a sentence into audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn is_ready(&self) -> bool;

    /// Audio for `text`, or `None` when not ready or synthesis failed.
    async fn synthesize(&self, text: &str) -> Option<Vec<u8>>;
}
