//! Ollama client struct, request building, and response parsing.

use serde_json::{json, Map, Value};

use crate::tools::to_ollama_tool;
use crate::{AiError, Message, ModelResponse, ToolCall, ToolDefinition};

use super::config::OllamaConfig;

/// Ollama API client.
pub struct OllamaClient {
    pub(crate) config: OllamaConfig,
    pub(crate) http: reqwest::Client,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self, AiError> {
        // No overall timeout here: streamed replies may legitimately run
        // long, one-shot requests set their own.
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| AiError::NetworkError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Build the JSON request body for `/api/chat`.
    pub(crate) fn build_request_body(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        stream: bool,
    ) -> Value {
        let msgs: Vec<Value> = messages.iter().map(to_wire_message).collect();

        let mut body = json!({
            "model": model,
            "messages": msgs,
            "stream": stream,
        });

        if !tools.is_empty() {
            let tool_defs: Vec<_> = tools.iter().map(to_ollama_tool).collect();
            body["tools"] = json!(tool_defs);
        }

        body
    }

    /// Parse a non-streaming response.
    pub(crate) fn parse_response(&self, json: Value) -> Result<ModelResponse, AiError> {
        if let Some(err) = json.get("error").and_then(Value::as_str) {
            return Err(AiError::ApiError(err.to_string()));
        }

        let message = json
            .get("message")
            .ok_or_else(|| AiError::ParseError("response has no `message` field".into()))?;

        let content = message["content"].as_str().unwrap_or_default().to_string();

        let tool_calls = match message.get("tool_calls").and_then(Value::as_array) {
            Some(calls) => calls.iter().map(parse_tool_call).collect::<Result<_, _>>()?,
            None => Vec::new(),
        };

        Ok(ModelResponse {
            content,
            tool_calls,
        })
    }
}

fn to_wire_message(msg: &Message) -> Value {
    match msg {
        Message::System { content } | Message::User { content } => json!({
            "role": msg.role().as_str(),
            "content": content,
        }),
        Message::Assistant {
            content,
            tool_calls,
        } => {
            let mut value = json!({ "role": "assistant", "content": content });
            if !tool_calls.is_empty() {
                let calls: Vec<Value> = tool_calls
                    .iter()
                    .map(|c| json!({ "function": { "name": c.name, "arguments": c.arguments } }))
                    .collect();
                value["tool_calls"] = json!(calls);
            }
            value
        }
        Message::Tool { content, tool_name } => json!({
            "role": "tool",
            "content": content,
            "tool_name": tool_name,
        }),
    }
}

fn parse_tool_call(call: &Value) -> Result<ToolCall, AiError> {
    let function = &call["function"];
    let name = function["name"]
        .as_str()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AiError::ParseError("tool call without a function name".into()))?
        .to_string();

    let arguments = match &function["arguments"] {
        Value::Null => Map::new(),
        Value::Object(map) => map.clone(),
        // Some models return the arguments as a JSON-encoded string.
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            _ => {
                return Err(AiError::ParseError(format!(
                    "arguments for tool '{name}' are not a JSON object"
                )))
            }
        },
        _ => {
            return Err(AiError::ParseError(format!(
                "arguments for tool '{name}' are not a JSON object"
            )))
        }
    };

    Ok(ToolCall { name, arguments })
}
