//! Client wire protocol: JSON text frames tagged by `type`.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tamara_common::TamaraError;

/// Tool results longer than this are cut on the wire.
pub const TOOL_RESULT_WIRE_CHARS: usize = 200;

/// Messages a client sends.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Message {
        #[serde(default)]
        content: String,
    },
    Ping,
    Reset,
}

impl ClientMessage {
    pub fn decode(text: &str) -> Result<Self, TamaraError> {
        serde_json::from_str(text).map_err(|e| TamaraError::MalformedInboundMessage(e.to_string()))
    }
}

/// Events the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Thinking,
    Token { content: String },
    ToolExecuting { tool: String },
    ToolResult { tool: String, result: String },
    Audio { content: String },
    Done,
    Error { content: String },
    Pong,
    System { content: String },
}

impl ServerEvent {
    /// Tool result with `result` cut to [`TOOL_RESULT_WIRE_CHARS`] characters.
    pub fn tool_result(tool: impl Into<String>, result: &str) -> Self {
        Self::ToolResult {
            tool: tool.into(),
            result: result.chars().take(TOOL_RESULT_WIRE_CHARS).collect(),
        }
    }

    pub fn audio(bytes: &[u8]) -> Self {
        Self::Audio {
            content: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::Error {
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn to_json(&self) -> String {
        // Plain enum of strings; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"error"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn wire(event: &ServerEvent) -> Value {
        serde_json::from_str(&event.to_json()).unwrap()
    }

    #[test]
    fn decodes_client_messages() {
        assert_eq!(
            ClientMessage::decode(r#"{"type":"message","content":"hola"}"#).unwrap(),
            ClientMessage::Message {
                content: "hola".into()
            }
        );
        assert_eq!(
            ClientMessage::decode(r#"{"type":"ping"}"#).unwrap(),
            ClientMessage::Ping
        );
        assert_eq!(
            ClientMessage::decode(r#"{"type":"reset","extra":1}"#).unwrap(),
            ClientMessage::Reset
        );
    }

    #[test]
    fn rejects_malformed_and_unknown() {
        for text in ["not json", r#"{"content":"x"}"#, r#"{"type":"shout"}"#, "[]"] {
            let err = ClientMessage::decode(text).unwrap_err();
            assert!(
                matches!(err, TamaraError::MalformedInboundMessage(_)),
                "{text}"
            );
        }
    }

    #[test]
    fn events_use_snake_case_tags() {
        assert_eq!(wire(&ServerEvent::Thinking), json!({"type": "thinking"}));
        assert_eq!(
            wire(&ServerEvent::ToolExecuting {
                tool: "get_table_count".into()
            }),
            json!({"type": "tool_executing", "tool": "get_table_count"})
        );
        assert_eq!(
            wire(&ServerEvent::system("History reset")),
            json!({"type": "system", "content": "History reset"})
        );
    }

    #[test]
    fn tool_result_truncates_by_chars() {
        let long = "ñ".repeat(250);
        match ServerEvent::tool_result("query_database", &long) {
            ServerEvent::ToolResult { result, .. } => {
                assert_eq!(result.chars().count(), TOOL_RESULT_WIRE_CHARS);
            }
            other => panic!("unexpected {other:?}"),
        }
        match ServerEvent::tool_result("t", "short") {
            ServerEvent::ToolResult { result, .. } => assert_eq!(result, "short"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn audio_is_base64() {
        assert_eq!(
            ServerEvent::audio(b"RIFF"),
            ServerEvent::Audio {
                content: "UklGRg==".into()
            }
        );
    }
}
