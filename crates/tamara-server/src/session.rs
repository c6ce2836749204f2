//! Per-connection session: decodes client messages and runs turns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tamara_ai::{clean_for_speech, AudioChunker, ChatEvent, ChatOrchestrator, SpeechSynthesizer};
use tamara_common::SessionId;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::app::AppContext;
use crate::protocol::{ClientMessage, ServerEvent};

const BUSY_MESSAGE: &str = "A response is already in progress";
const EVENT_BUFFER: usize = 64;

/// Releases the session's busy flag on drop, whichever way a turn ends.
struct TurnGuard {
    flag: Arc<AtomicBool>,
}

impl TurnGuard {
    /// Returns `None` if a turn is already running.
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// One client's conversation. At most one turn runs at a time.
pub struct ConnectionSession {
    id: SessionId,
    min_message_chars: usize,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    outbound: mpsc::Sender<ServerEvent>,
    orchestrator: Arc<Mutex<ChatOrchestrator>>,
    busy: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl ConnectionSession {
    /// Turn events are delivered on `outbound`.
    pub fn new(ctx: &AppContext, outbound: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            id: SessionId::new(),
            min_message_chars: ctx.config.server.min_message_chars as usize,
            speech: ctx.speech.clone(),
            outbound,
            orchestrator: Arc::new(Mutex::new(ctx.new_orchestrator())),
            busy: Arc::new(AtomicBool::new(false)),
            cancel: ctx.shutdown.child_token(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Handle one inbound text frame.
    ///
    /// Returns the immediate reply, if any. A `thinking` reply means a turn
    /// was started; its events follow on the outbound channel.
    pub async fn handle_text(&self, text: &str) -> Option<ServerEvent> {
        let message = match ClientMessage::decode(text) {
            Ok(m) => m,
            Err(e) => {
                debug!(session = %self.id.short(), error = %e, "rejected inbound message");
                return Some(ServerEvent::error(e.to_string()));
            }
        };

        match message {
            ClientMessage::Ping => Some(ServerEvent::Pong),
            ClientMessage::Reset => {
                if self.is_busy() {
                    return Some(ServerEvent::error(BUSY_MESSAGE));
                }
                self.orchestrator.lock().await.reset();
                debug!(session = %self.id.short(), "history reset");
                Some(ServerEvent::system("History reset"))
            }
            ClientMessage::Message { content } => self.start_turn(content.trim()),
        }
    }

    fn start_turn(&self, content: &str) -> Option<ServerEvent> {
        if content.chars().count() < self.min_message_chars {
            debug!(session = %self.id.short(), "ignoring short message");
            return None;
        }
        let Some(guard) = TurnGuard::acquire(&self.busy) else {
            debug!(session = %self.id.short(), "turn already running");
            return Some(ServerEvent::error(BUSY_MESSAGE));
        };

        let turn = Turn {
            session: self.id.clone(),
            orchestrator: self.orchestrator.clone(),
            speech: self.speech.clone(),
            outbound: self.outbound.clone(),
            cancel: self.cancel.child_token(),
        };
        tokio::spawn(turn.run(content.to_string(), guard));
        Some(ServerEvent::Thinking)
    }

    /// Cancel any running turn. Its staged history is discarded.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// One spawned turn: the orchestrator on one side, the event relay with
/// speech synthesis on the other.
struct Turn {
    session: SessionId,
    orchestrator: Arc<Mutex<ChatOrchestrator>>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    outbound: mpsc::Sender<ServerEvent>,
    cancel: CancellationToken,
}

impl Turn {
    async fn run(self, content: String, guard: TurnGuard) {
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let orchestrator = self.orchestrator.clone();
        let model_side = async move {
            let mut orchestrator = orchestrator.lock().await;
            // Failures are reported as events.
            let _ = orchestrator.run_turn(&content, &tx).await;
        };

        let mut guard = Some(guard);
        tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!(session = %self.session.short(), "turn cancelled");
            }
            _ = async { tokio::join!(model_side, self.relay(&mut rx, &mut guard)) } => {}
        }
    }

    async fn relay(&self, rx: &mut mpsc::Receiver<ChatEvent>, guard: &mut Option<TurnGuard>) {
        let mut chunker = AudioChunker::new();
        while let Some(event) = rx.recv().await {
            match event {
                ChatEvent::Token(token) => {
                    let unit = chunker.push(&token);
                    self.send(ServerEvent::Token { content: token }).await;
                    if let Some(unit) = unit {
                        self.speak(&unit).await;
                    }
                }
                ChatEvent::ToolExecuting { name } => {
                    self.send(ServerEvent::ToolExecuting { tool: name }).await;
                }
                ChatEvent::ToolResult { name, result } => {
                    self.send(ServerEvent::tool_result(name, &result)).await;
                }
                ChatEvent::Done => {
                    if let Some(rest) = chunker.finish() {
                        self.speak(&rest).await;
                    }
                    drop(guard.take());
                    self.send(ServerEvent::Done).await;
                }
                ChatEvent::Error(message) => {
                    drop(guard.take());
                    self.send(ServerEvent::error(message)).await;
                }
            }
        }
    }

    /// Synthesis problems only cost the audio for this unit.
    async fn speak(&self, unit: &str) {
        let Some(speech) = &self.speech else { return };
        if !speech.is_ready() {
            return;
        }
        let Some(text) = clean_for_speech(unit) else {
            return;
        };
        match speech.synthesize(&text).await {
            Some(audio) => self.send(ServerEvent::audio(&audio)).await,
            None => debug!(session = %self.session.short(), "no audio for unit"),
        }
    }

    async fn send(&self, event: ServerEvent) {
        if self.outbound.send(event).await.is_err() {
            warn!(session = %self.session.short(), "client gone, dropping turn event");
        }
    }
}
