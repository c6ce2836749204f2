//! Name-keyed tool lookup with a uniform invocation wrapper.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::ToolDefinition;

/// Why a tool handler could not produce its normal output.
///
/// `SecurityRejected`, `InvalidIdentifier` and `BackendUnavailable` are
/// refusals the model should read verbatim; their display is the tool
/// result. Everything else is reported as a failed execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Security error: {0}")]
    SecurityRejected(String),
    #[error("Error: {0}")]
    InvalidIdentifier(String),
    #[error("{0}")]
    ExecutionFailed(String),
    #[error("Error: {0}.")]
    BackendUnavailable(String),
}

impl ToolError {
    fn is_refusal(&self) -> bool {
        matches!(
            self,
            Self::SecurityRejected(_) | Self::InvalidIdentifier(_) | Self::BackendUnavailable(_)
        )
    }
}

/// A capability the model can invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String, ToolError>;
}

/// Registered tools in registration order.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<(String, Arc<dyn Tool>)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name is replaced in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        match self.tools.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => {
                debug!(tool = %name, "replacing registered tool");
                slot.1 = tool;
            }
            None => {
                info!(tool = %name, "registered tool");
                self.tools.push((name, tool));
            }
        }
    }

    /// Remove a tool. Returns `false` if no tool had that name.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.tools.len();
        self.tools.retain(|(n, _)| n != name);
        self.tools.len() != before
    }

    pub fn list_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|(_, t)| t.definition()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|(n, _)| n == name)
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Run a tool and always return text for the model.
    ///
    /// Unknown names, handler failures and handler panics are reported as
    /// text rather than as errors, so the model can see what went wrong.
    pub async fn invoke(&self, name: &str, arguments: &Map<String, Value>) -> String {
        let Some((_, tool)) = self.tools.iter().find(|(n, _)| n == name) else {
            warn!(tool = %name, "model requested unknown tool");
            return format!(
                "Tool '{name}' not found. Available: {}",
                self.tool_names().join(", ")
            );
        };

        let outcome = AssertUnwindSafe(tool.execute(arguments))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(result)) => {
                debug!(tool = %name, chars = result.chars().count(), "tool executed");
                result
            }
            Ok(Err(e)) if e.is_refusal() => {
                warn!(tool = %name, error = %e, "tool refused");
                e.to_string()
            }
            Ok(Err(e)) => {
                warn!(tool = %name, error = %e, "tool failed");
                format!("Error executing {name}: {e}")
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(tool = %name, panic = %message, "tool panicked");
                format!("Error executing {name}: tool panicked: {message}")
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::object_schema;
    use serde_json::json;

    struct Echo {
        name: &'static str,
        prefix: &'static str,
    }

    #[async_trait]
    impl Tool for Echo {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.name.into(),
                description: "echo the text argument".into(),
                parameters: object_schema(&[("text", "text to echo")], &["text"]),
            }
        }

        async fn execute(&self, arguments: &Map<String, Value>) -> Result<String, ToolError> {
            let text = arguments
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::InvalidArguments("missing `text`".into()))?;
            Ok(format!("{}{text}", self.prefix))
        }
    }

    fn echo(name: &'static str, prefix: &'static str) -> Arc<dyn Tool> {
        Arc::new(Echo { name, prefix })
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn register_keeps_order_and_replaces_in_place() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("a", ""));
        registry.register(echo("b", ""));
        registry.register(echo("a", "second:"));
        assert_eq!(registry.tool_names(), ["a", "b"]);
        assert_eq!(registry.count(), 2);
        assert!(registry.contains("b"));
    }

    #[test]
    fn unregister_reports_presence() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("a", ""));
        assert!(registry.unregister("a"));
        assert!(!registry.unregister("a"));
        assert!(registry.is_empty());
    }

    #[test]
    fn list_definitions_in_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("z", ""));
        registry.register(echo("m", ""));
        let names: Vec<_> = registry
            .list_definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, ["z", "m"]);
    }

    #[tokio::test]
    async fn invoke_runs_replacement_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("a", "first:"));
        registry.register(echo("a", "second:"));
        let out = registry.invoke("a", &args(json!({"text": "hi"}))).await;
        assert_eq!(out, "second:hi");
    }

    #[tokio::test]
    async fn invoke_unknown_tool_lists_available() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("a", ""));
        registry.register(echo("b", ""));
        let out = registry.invoke("nope", &Map::new()).await;
        assert_eq!(out, "Tool 'nope' not found. Available: a, b");
    }

    #[tokio::test]
    async fn invoke_failure_becomes_text() {
        let mut registry = ToolRegistry::new();
        registry.register(echo("a", ""));
        let out = registry.invoke("a", &Map::new()).await;
        assert_eq!(out, "Error executing a: invalid arguments: missing `text`");
    }

    struct Refusing(fn() -> ToolError);

    #[async_trait]
    impl Tool for Refusing {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "refusing".into(),
                description: "always fails".into(),
                parameters: object_schema(&[], &[]),
            }
        }

        async fn execute(&self, _arguments: &Map<String, Value>) -> Result<String, ToolError> {
            Err((self.0)())
        }
    }

    #[tokio::test]
    async fn refusals_are_returned_verbatim() {
        let cases: [(fn() -> ToolError, &str); 4] = [
            (
                || ToolError::SecurityRejected("Command 'DROP' not authorized.".into()),
                "Security error: Command 'DROP' not authorized.",
            ),
            (
                || ToolError::InvalidIdentifier("Invalid identifier: 1users".into()),
                "Error: Invalid identifier: 1users",
            ),
            (
                || ToolError::BackendUnavailable("No database connection".into()),
                "Error: No database connection.",
            ),
            (
                || ToolError::ExecutionFailed("disk full".into()),
                "Error executing refusing: disk full",
            ),
        ];
        for (make, expected) in cases {
            let mut registry = ToolRegistry::new();
            registry.register(Arc::new(Refusing(make)));
            assert_eq!(registry.invoke("refusing", &Map::new()).await, expected);
        }
    }

    struct Exploding;

    #[async_trait]
    impl Tool for Exploding {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "exploding".into(),
                description: "panics".into(),
                parameters: object_schema(&[], &[]),
            }
        }

        async fn execute(&self, _arguments: &Map<String, Value>) -> Result<String, ToolError> {
            panic!("row decoder blew up");
        }
    }

    #[tokio::test]
    async fn handler_panic_becomes_text() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Exploding));
        registry.register(echo("a", ""));

        let out = registry.invoke("exploding", &Map::new()).await;
        assert_eq!(
            out,
            "Error executing exploding: tool panicked: row decoder blew up"
        );

        let out = registry.invoke("a", &args(json!({"text": "still here"}))).await;
        assert_eq!(out, "still here");
    }
}
