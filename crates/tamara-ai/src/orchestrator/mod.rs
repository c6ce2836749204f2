//! Turn orchestration: one user utterance in, an ordered event stream out.
//!
//! Without tools a turn is a single streaming request. With tools it is a
//! one-shot request offering the tool definitions, serial execution of any
//! requested tool calls, and a second streaming request for the final
//! answer. A turn works on a staged copy of the history that is committed
//! only when the turn succeeds.

mod events;
mod state;
mod turn;


use std::time::Duration;

pub use events::ChatEvent;
pub use state::TurnState;
pub use turn::ChatOrchestrator;

/// Per-session orchestrator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    pub model: String,
    pub system_prompt: String,
    pub max_history: usize,
    /// Bound on each model request and on each individual stream read.
    pub request_timeout: Duration,
    /// Bound on each tool invocation.
    pub tool_timeout: Duration,
    pub tools_enabled: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-oss:20b".into(),
            system_prompt: "You are TAMARA, a helpful voice assistant.".into(),
            max_history: 500,
            request_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(30),
            tools_enabled: true,
        }
    }
}
