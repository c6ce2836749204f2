//! Guarded SQL access for Tamara's database tools.
//!
//! Queries go through a [`QueryGuard`] that only lets read statements
//! through unless writes are enabled, and table names are checked against
//! a strict identifier pattern before they are interpolated. The concrete
//! backend is a bounded MySQL/MariaDB pool; tests use in-memory fakes of
//! [`SqlBackend`].

pub mod backend;
pub mod client;
pub mod error;
pub mod format;
pub mod guard;
pub mod mysql;
pub mod row;
pub mod tools;

pub use backend::SqlBackend;
pub use client::DatabaseClient;
pub use error::DbError;
pub use guard::{validate_identifier, QueryGuard, ALLOWED_READ_COMMANDS};
pub use mysql::MySqlBackend;
pub use row::Row;
pub use tools::register_database_tools;
