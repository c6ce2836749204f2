//! Guarded database client used by the tools.

use std::sync::Arc;

use serde_json::Value;
use tamara_config::schema::DatabaseConfig;
use tracing::warn;

use crate::guard::{validate_identifier, QueryGuard};
use crate::row::scalar_text;
use crate::{DbError, MySqlBackend, Row, SqlBackend};

/// Validates statements before handing them to the backend.
///
/// A client without a backend reports [`DbError::NotConnected`] for every
/// call; the tools turn that into a message for the model.
#[derive(Clone)]
pub struct DatabaseClient {
    backend: Option<Arc<dyn SqlBackend>>,
    guard: QueryGuard,
}

impl DatabaseClient {
    pub fn new(backend: Arc<dyn SqlBackend>, allow_write: bool) -> Self {
        Self {
            backend: Some(backend),
            guard: QueryGuard::new(allow_write),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            backend: None,
            guard: QueryGuard::default(),
        }
    }

    /// Connect to MySQL/MariaDB. A failed connection yields a disconnected
    /// client so the server keeps running.
    pub async fn connect(config: &DatabaseConfig) -> Self {
        match MySqlBackend::connect(config).await {
            Ok(backend) => Self::new(Arc::new(backend), config.allow_write),
            Err(e) => {
                warn!(error = %e, "database unavailable, tools will report no connection");
                Self::disconnected()
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.backend.is_some()
    }

    /// Close the backend's connections. A disconnected client has none.
    pub async fn close(&self) {
        if let Some(backend) = &self.backend {
            backend.close().await;
        }
    }

    /// Run a statement after the read-only check.
    pub async fn execute(&self, query: &str, params: &[Value]) -> Result<Vec<Row>, DbError> {
        let backend = self.backend.as_ref().ok_or(DbError::NotConnected)?;
        self.guard.validate_query(query)?;
        backend.fetch_all(query.trim(), params).await
    }

    /// The column name depends on the database name, so take the first one.
    pub async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let rows = self.execute("SHOW TABLES", &[]).await?;
        Ok(first_column(&rows))
    }

    pub async fn describe_table(&self, table: &str) -> Result<Vec<Row>, DbError> {
        validate_identifier(table)?;
        self.execute(&format!("DESCRIBE {table}"), &[]).await
    }

    pub async fn get_table_count(&self, table: &str) -> Result<u64, DbError> {
        validate_identifier(table)?;
        let rows = self
            .execute(&format!("SELECT COUNT(*) AS count FROM {table}"), &[])
            .await?;
        let Some(value) = rows.first().and_then(|r| r.get("count")) else {
            return Ok(0);
        };
        value
            .as_u64()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
            .ok_or_else(|| DbError::Query(format!("unexpected count value: {value}")))
    }
}

fn first_column(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .filter_map(|r| r.first().and_then(scalar_text))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Returns canned rows keyed by query prefix and records every query.
    #[derive(Default)]
    pub(crate) struct FakeBackend {
        pub responses: Vec<(&'static str, Result<Vec<Row>, String>)>,
        pub queries: Mutex<Vec<String>>,
        pub closed: AtomicBool,
    }

    impl FakeBackend {
        pub fn with(responses: Vec<(&'static str, Result<Vec<Row>, String>)>) -> Arc<Self> {
            Arc::new(Self {
                responses,
                ..Self::default()
            })
        }

        pub fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SqlBackend for FakeBackend {
        async fn fetch_all(&self, query: &str, _params: &[Value]) -> Result<Vec<Row>, DbError> {
            self.queries.lock().unwrap().push(query.to_string());
            self.responses
                .iter()
                .find(|(prefix, _)| query.starts_with(prefix))
                .map(|(_, r)| r.clone().map_err(DbError::Query))
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    pub(crate) fn rows(values: &[(&str, Value)]) -> Vec<Row> {
        values
            .iter()
            .map(|(k, v)| [(k.to_string(), v.clone())].into_iter().collect())
            .collect()
    }

    #[tokio::test]
    async fn rejected_query_never_reaches_backend() {
        let backend = FakeBackend::with(vec![]);
        let client = DatabaseClient::new(backend.clone(), false);
        let err = client.execute("DELETE FROM users", &[]).await.unwrap_err();
        assert!(matches!(err, DbError::SecurityRejected(_)));
        assert!(backend.queries().is_empty());
    }

    #[tokio::test]
    async fn stacked_statements_never_reach_backend() {
        let backend = FakeBackend::with(vec![]);
        for allow_write in [false, true] {
            let client = DatabaseClient::new(backend.clone(), allow_write);
            let err = client
                .execute("SELECT 1; DROP TABLE users", &[])
                .await
                .unwrap_err();
            assert!(matches!(err, DbError::MultipleStatements));
        }
        assert!(backend.queries().is_empty());

        let client = DatabaseClient::new(backend.clone(), false);
        client.execute("SELECT 1;", &[]).await.unwrap();
        assert_eq!(backend.queries(), ["SELECT 1;"]);
    }

    #[tokio::test]
    async fn close_reaches_backend() {
        let backend = FakeBackend::with(vec![]);
        let client = DatabaseClient::new(backend.clone(), false);
        client.close().await;
        assert!(backend.closed.load(Ordering::SeqCst));

        DatabaseClient::disconnected().close().await;
    }

    #[tokio::test]
    async fn invalid_identifier_never_reaches_backend() {
        let backend = FakeBackend::with(vec![]);
        let client = DatabaseClient::new(backend.clone(), true);
        let err = client
            .get_table_count("users; DROP TABLE x")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidIdentifier(_)));
        assert!(backend.queries().is_empty());
    }

    #[tokio::test]
    async fn list_tables_takes_first_column() {
        let backend = FakeBackend::with(vec![(
            "SHOW TABLES",
            Ok(rows(&[
                ("Tables_in_shop", json!("orders")),
                ("Tables_in_shop", json!("users")),
            ])),
        )]);
        let client = DatabaseClient::new(backend, false);
        assert_eq!(client.list_tables().await.unwrap(), ["orders", "users"]);
    }

    #[tokio::test]
    async fn count_accepts_numbers_and_strings() {
        let backend = FakeBackend::with(vec![("SELECT COUNT(*)", Ok(rows(&[("count", json!(42))])))]);
        let client = DatabaseClient::new(backend.clone(), false);
        assert_eq!(client.get_table_count("users").await.unwrap(), 42);
        assert_eq!(
            backend.queries(),
            ["SELECT COUNT(*) AS count FROM users"]
        );

        let backend = FakeBackend::with(vec![("SELECT COUNT(*)", Ok(rows(&[("count", json!("7"))])))]);
        let client = DatabaseClient::new(backend, false);
        assert_eq!(client.get_table_count("users").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn disconnected_client_reports_not_connected() {
        let client = DatabaseClient::disconnected();
        assert!(!client.is_connected());
        assert!(matches!(
            client.list_tables().await,
            Err(DbError::NotConnected)
        ));
    }
}
