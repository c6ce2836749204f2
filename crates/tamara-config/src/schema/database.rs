//! MariaDB / MySQL connection settings.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Allow statements other than SELECT/SHOW/DESCRIBE/DESC/EXPLAIN.
    pub allow_write: bool,
    /// Connection pool size (valid range: 1-64).
    pub pool_size: u32,
    pub acquire_timeout_secs: u32,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("enabled", &self.enabled)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("database", &self.database)
            .field("allow_write", &self.allow_write)
            .field("pool_size", &self.pool_size)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "localhost".into(),
            port: 3306,
            user: "root".into(),
            password: String::new(),
            database: String::new(),
            allow_write: false,
            pool_size: 3,
            acquire_timeout_secs: 10,
        }
    }
}
