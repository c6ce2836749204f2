//! Tools the model can call during a turn.
//!
//! A tool bundles its [`ToolDefinition`](crate::ToolDefinition) with an async
//! handler. The [`ToolRegistry`] is built once at startup and shared
//! read-only between sessions afterwards.

mod definitions;
mod registry;

pub use definitions::{object_schema, to_ollama_tool};
pub use registry::{Tool, ToolError, ToolRegistry};
