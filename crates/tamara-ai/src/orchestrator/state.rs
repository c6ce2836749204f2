//! Turn state machine and the guard that returns it to idle.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    AwaitingFirstResponse,
    Streaming,
    ToolsRequested,
    ExecutingTools,
    AwaitingFinalResponse,
    StreamingFinal,
}

impl TurnState {
    pub fn is_busy(self) -> bool {
        self != Self::Idle
    }
}

/// Publishes state changes for one turn and resets to `Idle` on drop, so a
/// cancelled or failed turn never leaves the state stuck.
pub(crate) struct StateGuard {
    tx: Arc<watch::Sender<TurnState>>,
}

impl StateGuard {
    pub(crate) fn enter(tx: Arc<watch::Sender<TurnState>>, state: TurnState) -> Self {
        tx.send_replace(state);
        Self { tx }
    }

    pub(crate) fn set(&self, state: TurnState) {
        self.tx.send_replace(state);
    }
}

impl Drop for StateGuard {
    fn drop(&mut self) {
        self.tx.send_replace(TurnState::Idle);
    }
}
