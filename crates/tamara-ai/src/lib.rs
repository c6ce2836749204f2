//! Conversation engine for Tamara.
//!
//! Provides the model backend abstraction and its Ollama client, plus:
//! - NDJSON token streaming
//! - Tool registry with uniform, never-failing invocation
//! - Bounded conversation history
//! - The two-phase tool-calling turn orchestrator
//! - Sentence chunking and the speech synthesis client

pub mod chunker;
pub mod history;
pub mod ollama;
pub mod orchestrator;
pub mod speech;
pub mod streaming;
pub mod tools;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tamara_common::TamaraError;

pub use chunker::{clean_for_speech, AudioChunker};
pub use history::ConversationHistory;
pub use ollama::{OllamaClient, OllamaConfig};
pub use orchestrator::{ChatEvent, ChatOrchestrator, OrchestratorConfig, TurnState};
pub use speech::{SpeechEngine, SpeechSettings, SpeechSynthesizer};
pub use tools::{Tool, ToolError, ToolRegistry};

/// Lazily produced text tokens of a streaming model response.
pub type TokenStream = BoxStream<'static, Result<String, AiError>>;

/// A language model that can answer a conversation, with or without tools.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// One-shot completion. Tool definitions are offered to the model when
    /// `tools` is non-empty.
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse, AiError>;

    /// Streaming completion without tools.
    async fn chat_stream(&self, model: &str, messages: &[Message]) -> Result<TokenStream, AiError>;
}

/// One entry of a conversation, tagged by role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        content: String,
        tool_name: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Tool {
            content: content.into(),
            tool_name: tool_name.into(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::Tool { .. } => Role::Tool,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::System { content }
            | Self::User { content }
            | Self::Assistant { content, .. }
            | Self::Tool { content, .. } => content,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Tool => "tool",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// A complete, non-streamed model reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout after {0}s")]
    Timeout(u64),
    #[error("Tool '{0}' timed out after {1}s")]
    ToolTimeout(String, u64),
}

impl From<AiError> for TamaraError {
    fn from(err: AiError) -> Self {
        TamaraError::BackendUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_serializes_with_role_tag() {
        let json = serde_json::to_value(Message::user("hola")).unwrap();
        assert_eq!(json, json!({"role": "user", "content": "hola"}));

        let json = serde_json::to_value(Message::tool("get_table_count", "42")).unwrap();
        assert_eq!(
            json,
            json!({"role": "tool", "content": "42", "tool_name": "get_table_count"})
        );
    }

    #[test]
    fn assistant_without_tool_calls_omits_field() {
        let json = serde_json::to_value(Message::assistant("hi")).unwrap();
        assert!(json.get("tool_calls").is_none());

        let back: Message = serde_json::from_value(json).unwrap();
        assert_eq!(back, Message::assistant("hi"));
    }

    #[test]
    fn role_and_content_accessors() {
        let msg = Message::system("be brief");
        assert_eq!(msg.role(), Role::System);
        assert_eq!(msg.content(), "be brief");
        assert_eq!(Role::Tool.as_str(), "tool");
    }

    #[test]
    fn ai_error_becomes_backend_unavailable() {
        let err: TamaraError = AiError::Timeout(120).into();
        assert!(matches!(err, TamaraError::BackendUnavailable(_)));
        assert!(err.to_string().contains("120"));
    }
}
