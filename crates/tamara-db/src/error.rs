use tamara_ai::ToolError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Only read queries are allowed. Command '{0}' not authorized.")]
    SecurityRejected(String),

    #[error("Only one statement per query is allowed.")]
    MultipleStatements,

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("No database connection")]
    NotConnected,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Query(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => DbError::NotConnected,
            other => DbError::Query(other.to_string()),
        }
    }
}

/// Refusals keep their message for the model; query failures carry the
/// server's error text.
impl From<DbError> for ToolError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::SecurityRejected(_) | DbError::MultipleStatements => {
                ToolError::SecurityRejected(err.to_string())
            }
            DbError::InvalidIdentifier(_) => ToolError::InvalidIdentifier(err.to_string()),
            DbError::NotConnected | DbError::Connect(_) => {
                ToolError::BackendUnavailable(err.to_string())
            }
            DbError::Query(m) => ToolError::ExecutionFailed(m),
        }
    }
}
