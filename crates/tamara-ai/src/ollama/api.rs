//! ModelBackend trait implementation for OllamaClient (chat + streaming).

use async_trait::async_trait;
use tracing::debug;

use crate::streaming::ndjson_token_stream;
use crate::{AiError, Message, ModelBackend, ModelResponse, TokenStream, ToolDefinition};

use super::client::OllamaClient;

#[async_trait]
impl ModelBackend for OllamaClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse, AiError> {
        let body = self.build_request_body(model, messages, tools, false);

        debug!(%model, messages = messages.len(), tools = tools.len(), "Ollama chat request");

        let response = self
            .http
            .post(self.config.chat_url())
            .timeout(self.config.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = check_status(response).await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiError::ParseError(e.to_string()))?;

        self.parse_response(json)
    }

    async fn chat_stream(&self, model: &str, messages: &[Message]) -> Result<TokenStream, AiError> {
        let body = self.build_request_body(model, messages, &[], true);

        debug!(%model, messages = messages.len(), "Ollama streaming request");

        let response = self
            .http
            .post(self.config.chat_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = check_status(response).await?;
        Ok(ndjson_token_stream(response))
    }
}

impl OllamaClient {
    fn map_send_error(&self, err: reqwest::Error) -> AiError {
        if err.is_timeout() {
            AiError::Timeout(self.config.request_timeout.as_secs())
        } else {
            AiError::NetworkError(err.to_string())
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AiError> {
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(AiError::RateLimited);
    }
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let text = text.chars().take(200).collect::<String>();
        return Err(AiError::ApiError(format!("HTTP {status}: {text}")));
    }
    Ok(response)
}
