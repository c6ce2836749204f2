//! MySQL / MariaDB backend over a bounded sqlx pool.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{json, Value};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Executor, Row as _, TypeInfo};
use tamara_config::schema::DatabaseConfig;
use tracing::{debug, info};

use crate::{DbError, Row, SqlBackend};

#[derive(Clone)]
pub struct MySqlBackend {
    pool: MySqlPool,
}

impl MySqlBackend {
    /// Open the pool and make sure one connection can be established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            pool_size = config.pool_size,
            "connecting to database"
        );

        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(u64::from(config.acquire_timeout_secs)))
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connect(e.to_string()))?;

        info!(database = %config.database, host = %config.host, "database connected");
        Ok(Self { pool })
    }
}

#[async_trait]
impl SqlBackend for MySqlBackend {
    async fn fetch_all(&self, query: &str, params: &[Value]) -> Result<Vec<Row>, DbError> {
        debug!(%query, params = params.len(), "executing query");

        let rows = if params.is_empty() {
            // Plain text protocol: SHOW and DESCRIBE are not all preparable.
            // The server runs every statement it is sent here, so callers
            // must reject stacked statements first (see `QueryGuard`).
            self.pool.fetch_all(query).await?
        } else {
            let mut q = sqlx::query(query);
            for param in params {
                q = match param {
                    Value::Null => q.bind(None::<String>),
                    Value::Bool(b) => q.bind(*b),
                    Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                        (Some(i), _) => q.bind(i),
                        (None, Some(f)) => q.bind(f),
                        _ => q.bind(n.to_string()),
                    },
                    Value::String(s) => q.bind(s.clone()),
                    other => q.bind(other.to_string()),
                };
            }
            q.fetch_all(&self.pool).await?
        };

        Ok(rows.iter().map(decode_row).collect())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("database pool closed");
    }
}

fn decode_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .map(|col| {
            let index = col.ordinal();
            (col.name().to_string(), decode_value(row, index, col.type_info().name()))
        })
        .collect()
}

fn decode_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    fn get<'r, T>(row: &'r MySqlRow, index: usize) -> Option<Option<T>>
    where
        T: sqlx::Decode<'r, sqlx::MySql>,
    {
        row.try_get_unchecked::<Option<T>, _>(index).ok()
    }

    let decoded = match type_name {
        "NULL" => Some(Value::Null),
        "BOOLEAN" => get::<bool>(row, index).map(|v| json!(v)),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            get::<i64>(row, index).map(|v| json!(v))
        }
        t if t.ends_with("UNSIGNED") => get::<u64>(row, index).map(|v| json!(v)),
        "FLOAT" | "DOUBLE" => get::<f64>(row, index).map(|v| json!(v)),
        "DATE" => get::<NaiveDate>(row, index).map(|v| json!(v.map(|d| d.to_string()))),
        "TIME" => get::<NaiveTime>(row, index).map(|v| json!(v.map(|t| t.to_string()))),
        "DATETIME" => get::<NaiveDateTime>(row, index).map(|v| json!(v.map(|d| d.to_string()))),
        "TIMESTAMP" => get::<DateTime<Utc>>(row, index).map(|v| json!(v.map(|d| d.to_string()))),
        _ => None,
    };

    // DECIMAL, text, JSON, ENUM and friends arrive as strings; blobs may
    // not be valid UTF-8.
    decoded
        .or_else(|| get::<String>(row, index).map(|v| json!(v)))
        .or_else(|| {
            get::<Vec<u8>>(row, index)
                .map(|v| json!(v.map(|bytes| format!("<{} bytes>", bytes.len()))))
        })
        .unwrap_or(Value::Null)
}
