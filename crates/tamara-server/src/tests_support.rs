//! Scripted collaborators for server tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde_json::{Map, Value};
use tamara_ai::tools::object_schema;
use tamara_ai::{
    AiError, Message, ModelBackend, ModelResponse, SpeechSynthesizer, TokenStream, Tool,
    ToolDefinition, ToolError, ToolRegistry,
};
use tamara_config::TamaraConfig;
use tamara_db::{DbError, Row, SqlBackend};
use tokio::sync::mpsc;

use crate::app::AppContext;
use crate::protocol::ServerEvent;

pub enum Step {
    Reply(ModelResponse),
    Tokens(Vec<&'static str>),
    Fail(&'static str),
    Hang,
}

/// Answers model requests from a fixed script, in order.
pub struct ScriptedBackend {
    steps: Mutex<VecDeque<Step>>,
}

impl ScriptedBackend {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
        })
    }

    fn next_step(&self) -> Step {
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected model request")
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn chat(
        &self,
        _model: &str,
        _messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<ModelResponse, AiError> {
        match self.next_step() {
            Step::Reply(r) => Ok(r),
            Step::Fail(e) => Err(AiError::NetworkError(e.into())),
            Step::Hang => std::future::pending().await,
            Step::Tokens(_) => panic!("tokens scripted for one-shot call"),
        }
    }

    async fn chat_stream(&self, _model: &str, _messages: &[Message]) -> Result<TokenStream, AiError> {
        match self.next_step() {
            Step::Tokens(tokens) => {
                let items: Vec<Result<String, AiError>> =
                    tokens.into_iter().map(|t| Ok(t.to_string())).collect();
                Ok(stream::iter(items).boxed())
            }
            Step::Fail(e) => Err(AiError::NetworkError(e.into())),
            Step::Hang => std::future::pending().await,
            Step::Reply(_) => panic!("reply scripted for streaming call"),
        }
    }
}

pub struct FakeSpeech {
    ready: bool,
}

impl FakeSpeech {
    pub fn ready() -> Arc<dyn SpeechSynthesizer> {
        Arc::new(Self { ready: true })
    }

    pub fn not_ready() -> Arc<dyn SpeechSynthesizer> {
        Arc::new(Self { ready: false })
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn synthesize(&self, text: &str) -> Option<Vec<u8>> {
        self.ready.then(|| format!("RIFF:{text}").into_bytes())
    }
}

struct CountTool;

#[async_trait]
impl Tool for CountTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_table_count".into(),
            description: "Count rows".into(),
            parameters: object_schema(&[("table_name", "Table name")], &["table_name"]),
        }
    }

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String, ToolError> {
        let table = arguments
            .get("table_name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(format!("Table '{table}' has 42 records."))
    }
}

/// Answers every call with a listing far longer than the wire limit.
struct ListingTool;

/// Text returned by the `list_orders` tool.
pub fn long_listing() -> String {
    (1..=40)
        .map(|i| format!("{i}. {{'id': {i}, 'total': 9.99}}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Tool for ListingTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_orders".into(),
            description: "List orders".into(),
            parameters: object_schema(&[], &[]),
        }
    }

    async fn execute(&self, _arguments: &Map<String, Value>) -> Result<String, ToolError> {
        Ok(long_listing())
    }
}

pub fn tool_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(CountTool));
    registry.register(Arc::new(ListingTool));
    registry
}

/// SQL backend that only records whether it was closed.
#[derive(Default)]
pub struct ClosableSql {
    closed: AtomicBool,
}

impl ClosableSql {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SqlBackend for ClosableSql {
    async fn fetch_all(&self, _query: &str, _params: &[Value]) -> Result<Vec<Row>, DbError> {
        Ok(Vec::new())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub fn context(
    backend: Arc<ScriptedBackend>,
    tools: ToolRegistry,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
) -> AppContext {
    let mut config = TamaraConfig::default();
    config.tools.enabled = true;
    AppContext::new(config, backend, tools, speech)
}

/// Collect events up to and including `done` or `error`.
pub async fn recv_until_terminal(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for turn events")
            .expect("event channel closed");
        let terminal = matches!(event, ServerEvent::Done | ServerEvent::Error { .. });
        events.push(event);
        if terminal {
            return events;
        }
    }
}
