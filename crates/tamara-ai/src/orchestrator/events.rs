/// Observable progress of a turn, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Incremental model text, or the full text of a one-shot reply.
    Token(String),
    ToolExecuting { name: String },
    /// Carries the full tool output; callers truncate for display.
    ToolResult { name: String, result: String },
    Done,
    Error(String),
}

impl ChatEvent {
    /// `Done` and `Error` end a turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }
}
