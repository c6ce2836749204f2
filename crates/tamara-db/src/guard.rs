//! Statement and identifier validation.

use std::sync::LazyLock;

use regex::Regex;

use crate::DbError;

/// Leading keywords accepted without write access.
pub const ALLOWED_READ_COMMANDS: [&str; 5] = ["SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN"];

/// Rejects non-read statements unless writes are enabled, and stacked
/// statements always.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryGuard {
    allow_write: bool,
}

impl QueryGuard {
    pub fn new(allow_write: bool) -> Self {
        Self { allow_write }
    }

    /// Check the statement's first keyword, case-insensitively.
    ///
    /// Queries are sent over the text protocol, where the server runs every
    /// `;`-separated statement, so only a single statement passes. Trailing
    /// semicolons are fine. A `;` inside a string literal is rejected too.
    pub fn validate_query(&self, query: &str) -> Result<(), DbError> {
        if is_stacked(query) {
            return Err(DbError::MultipleStatements);
        }

        let first = query
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        if self.allow_write || ALLOWED_READ_COMMANDS.contains(&first.as_str()) {
            Ok(())
        } else {
            Err(DbError::SecurityRejected(first))
        }
    }
}

fn is_stacked(query: &str) -> bool {
    query
        .trim_end_matches(|c: char| c == ';' || c.is_whitespace())
        .contains(';')
}

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier: static regex pattern must compile")
});

/// Table and column names must match `^[A-Za-z_][A-Za-z0-9_]*$`.
pub fn validate_identifier(identifier: &str) -> Result<(), DbError> {
    if IDENTIFIER_RE.is_match(identifier) {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(identifier.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_rejected_without_access() {
        let guard = QueryGuard::new(false);
        let err = guard.validate_query("DROP TABLE x").unwrap_err();
        assert!(matches!(err, DbError::SecurityRejected(ref c) if c == "DROP"));
        assert!(guard.validate_query("  insert into t values (1)").is_err());
        assert!(guard.validate_query("").is_err());
    }

    #[test]
    fn write_accepted_with_access() {
        assert!(QueryGuard::new(true).validate_query("DROP TABLE x").is_ok());
    }

    #[test]
    fn reads_always_accepted() {
        for allow_write in [false, true] {
            let guard = QueryGuard::new(allow_write);
            for q in ["SELECT 1", "select * from users", "SHOW TABLES", "desc users", "EXPLAIN SELECT 1"] {
                assert!(guard.validate_query(q).is_ok(), "{q}");
            }
        }
    }

    #[test]
    fn stacked_statements_rejected_even_with_write_access() {
        for allow_write in [false, true] {
            let guard = QueryGuard::new(allow_write);
            for q in [
                "SELECT 1; DROP TABLE x",
                "select * from users;delete from users",
                "SHOW TABLES ; ; UPDATE t SET a = 1",
                "SELECT ';'",
            ] {
                assert!(
                    matches!(guard.validate_query(q), Err(DbError::MultipleStatements)),
                    "{q}"
                );
            }
        }
    }

    #[test]
    fn trailing_semicolons_allowed() {
        let guard = QueryGuard::new(false);
        assert!(guard.validate_query("SELECT 1;").is_ok());
        assert!(guard.validate_query("SELECT 1 ; ;  \n").is_ok());
        assert!(matches!(
            guard.validate_query("DROP TABLE x;"),
            Err(DbError::SecurityRejected(_))
        ));
    }

    #[test]
    fn identifiers() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("_order_items2").is_ok());
        assert!(validate_identifier("users; DROP TABLE x").is_err());
        assert!(validate_identifier("1users").is_err());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("usuarios-2").is_err());
    }
}
