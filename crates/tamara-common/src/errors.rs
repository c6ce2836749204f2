use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Process-level errors shared by every crate in the workspace.
///
/// Tool-level failures (rejected statements, bad identifiers, failed tool
/// runs) never reach this type: `tamara_ai::ToolError` carries them and the
/// tool registry turns them into text for the model.
#[derive(Debug, thiserror::Error)]
pub enum TamaraError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("malformed inbound message: {0}")]
    MalformedInboundMessage(String),
}
