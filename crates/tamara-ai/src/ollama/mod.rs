//! Ollama chat API client.
//!
//! Implements the `ModelBackend` trait against a local or remote Ollama
//! server (`POST {base_url}/api/chat`). One-shot calls send
//! `"stream": false` and read a single JSON object; streaming calls read
//! newline-delimited JSON chunks.

mod api;
mod client;
mod config;

pub use client::OllamaClient;
pub use config::OllamaConfig;
