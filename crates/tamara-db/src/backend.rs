use async_trait::async_trait;
use serde_json::Value;

use crate::{DbError, Row};

/// Executes already-validated SQL and returns every row.
#[async_trait]
pub trait SqlBackend: Send + Sync {
    async fn fetch_all(&self, query: &str, params: &[Value]) -> Result<Vec<Row>, DbError>;

    /// Release pooled connections. Later queries fail.
    async fn close(&self) {}
}
