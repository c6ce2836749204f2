//! The orchestrator and the two-phase turn protocol.

use std::future::Future;
use std::sync::Arc;

use futures_util::StreamExt;
use tamara_common::new_correlation_id;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::history::ConversationHistory;
use crate::tools::ToolRegistry;
use crate::{AiError, ModelBackend};

use super::events::ChatEvent;
use super::state::{StateGuard, TurnState};
use super::OrchestratorConfig;

/// Drives model exchanges for one session and owns its history.
pub struct ChatOrchestrator {
    backend: Arc<dyn ModelBackend>,
    tools: Arc<ToolRegistry>,
    config: OrchestratorConfig,
    history: ConversationHistory,
    state: Arc<watch::Sender<TurnState>>,
}

impl ChatOrchestrator {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        tools: Arc<ToolRegistry>,
        config: OrchestratorConfig,
    ) -> Self {
        let history = ConversationHistory::new(config.system_prompt.clone(), config.max_history);
        let (state, _) = watch::channel(TurnState::Idle);
        Self {
            backend,
            tools,
            config,
            history,
            state: Arc::new(state),
        }
    }

    /// Process one utterance, sending events to `events` as they happen.
    ///
    /// Ends with exactly one terminal event: `Done` on success, `Error` on
    /// any backend failure or timeout. On error the history is unchanged.
    /// Returns the final assistant text.
    pub async fn run_turn(
        &mut self,
        utterance: &str,
        events: &mpsc::Sender<ChatEvent>,
    ) -> Result<String, AiError> {
        let turn = new_correlation_id();
        let guard = StateGuard::enter(self.state.clone(), TurnState::AwaitingFirstResponse);

        let mut staged = self.history.clone();
        staged.append_user(utterance);

        let use_tools = self.tools_enabled();
        info!(%turn, model = %self.config.model, tools = use_tools, "turn started");

        let result = if use_tools {
            self.tool_turn(&mut staged, events, &guard).await
        } else {
            self.stream_reply(&mut staged, events, &guard, TurnState::Streaming)
                .await
        };

        match result {
            Ok(text) => {
                self.history = staged;
                emit(events, ChatEvent::Done).await;
                info!(%turn, chars = text.chars().count(), history = self.history.len(), "turn done");
                Ok(text)
            }
            Err(e) => {
                warn!(%turn, error = %e, "turn failed");
                emit(events, ChatEvent::Error(e.to_string())).await;
                Err(e)
            }
        }
    }

    async fn tool_turn(
        &self,
        staged: &mut ConversationHistory,
        events: &mpsc::Sender<ChatEvent>,
        guard: &StateGuard,
    ) -> Result<String, AiError> {
        let definitions = self.tools.list_definitions();
        let response = self
            .bounded(self.backend.chat(&self.config.model, staged.messages(), &definitions))
            .await??;

        if response.tool_calls.is_empty() {
            let content = response.content;
            if !content.is_empty() {
                staged.append_assistant(content.clone());
                emit(events, ChatEvent::Token(content.clone())).await;
            }
            return Ok(content);
        }

        guard.set(TurnState::ToolsRequested);
        let calls = response.tool_calls.clone();
        debug!(calls = calls.len(), "model requested tools");
        staged.append_model_tool_request(response.content, response.tool_calls);

        guard.set(TurnState::ExecutingTools);
        let limit = self.config.tool_timeout;
        for call in &calls {
            emit(
                events,
                ChatEvent::ToolExecuting {
                    name: call.name.clone(),
                },
            )
            .await;

            let result = tokio::time::timeout(limit, self.tools.invoke(&call.name, &call.arguments))
                .await
                .map_err(|_| AiError::ToolTimeout(call.name.clone(), limit.as_secs()))?;

            emit(
                events,
                ChatEvent::ToolResult {
                    name: call.name.clone(),
                    result: result.clone(),
                },
            )
            .await;
            staged.append_tool_result(call.name.clone(), result);
        }

        guard.set(TurnState::AwaitingFinalResponse);
        self.stream_reply(staged, events, guard, TurnState::StreamingFinal)
            .await
    }

    /// Stream a reply for the staged history and append it when non-blank.
    async fn stream_reply(
        &self,
        staged: &mut ConversationHistory,
        events: &mpsc::Sender<ChatEvent>,
        guard: &StateGuard,
        streaming: TurnState,
    ) -> Result<String, AiError> {
        let mut stream = self
            .bounded(self.backend.chat_stream(&self.config.model, staged.messages()))
            .await??;
        guard.set(streaming);

        let mut full = String::new();
        while let Some(token) = self.bounded(stream.next()).await? {
            let token = token?;
            if token.is_empty() {
                continue;
            }
            full.push_str(&token);
            emit(events, ChatEvent::Token(token)).await;
        }

        if !full.trim().is_empty() {
            staged.append_assistant(full.clone());
        }
        Ok(full)
    }

    async fn bounded<T>(&self, fut: impl Future<Output = T>) -> Result<T, AiError> {
        let limit = self.config.request_timeout;
        tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| AiError::Timeout(limit.as_secs()))
    }

    /// Clear history back to the system directive.
    pub fn reset(&mut self) {
        self.history.reset(self.config.system_prompt.clone());
        debug!("history reset");
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.config.model = model.into();
        info!(model = %self.config.model, "model changed");
    }

    /// Replace the system directive. Resets the history.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.config.system_prompt = prompt.into();
        self.reset();
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Number of messages excluding the system directive.
    pub fn history_length(&self) -> usize {
        self.history.len().saturating_sub(1)
    }

    /// Tools are used only when enabled and at least one is registered.
    pub fn tools_enabled(&self) -> bool {
        self.config.tools_enabled && !self.tools.is_empty()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn state(&self) -> TurnState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<TurnState> {
        self.state.subscribe()
    }
}

async fn emit(events: &mpsc::Sender<ChatEvent>, event: ChatEvent) {
    if events.send(event).await.is_err() {
        debug!("event receiver dropped");
    }
}
