//! The database tools offered to the model.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tamara_ai::tools::object_schema;
use tamara_ai::{Tool, ToolDefinition, ToolError, ToolRegistry};
use tracing::{debug, warn};

use crate::format::format_rows;
use crate::{DatabaseClient, DbError};

const MISSING_TABLE: &str = "Error: You must provide the table name.";

/// Register the database tools whose names appear in `available`.
/// Returns how many were registered.
pub fn register_database_tools(
    registry: &mut ToolRegistry,
    client: Arc<DatabaseClient>,
    available: &[String],
) -> usize {
    let tools: [Arc<dyn Tool>; 4] = [
        Arc::new(ListTablesTool::new(client.clone())),
        Arc::new(DescribeTableTool::new(client.clone())),
        Arc::new(QueryDatabaseTool::new(client.clone())),
        Arc::new(GetTableCountTool::new(client)),
    ];

    let mut registered = 0;
    for tool in tools {
        let name = tool.definition().name;
        if available.iter().any(|a| *a == name) {
            registry.register(tool);
            registered += 1;
        } else {
            debug!(tool = %name, "database tool not in tools.available, skipped");
        }
    }
    registered
}

fn ensure_connected(client: &DatabaseClient) -> Result<(), ToolError> {
    if client.is_connected() {
        Ok(())
    } else {
        Err(DbError::NotConnected.into())
    }
}

/// Optional string argument; present but non-string is an error.
fn string_arg(arguments: &Map<String, Value>, key: &str) -> Result<Option<String>, ToolError> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => Err(ToolError::InvalidArguments(format!(
            "`{key}` must be a string, got {other}"
        ))),
    }
}

pub struct ListTablesTool {
    client: Arc<DatabaseClient>,
}

impl ListTablesTool {
    pub fn new(client: Arc<DatabaseClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ListTablesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_database_tables".into(),
            description: "List all available tables in the MariaDB database. \
                          Use this tool to know which tables exist before making queries."
                .into(),
            parameters: object_schema(&[], &[]),
        }
    }

    async fn execute(&self, _arguments: &Map<String, Value>) -> Result<String, ToolError> {
        ensure_connected(&self.client)?;
        match self.client.list_tables().await {
            Ok(tables) if tables.is_empty() => Ok("The database has no tables.".into()),
            Ok(tables) => Ok(format!(
                "Available tables ({}): {}",
                tables.len(),
                tables.join(", ")
            )),
            Err(DbError::Query(m)) => Ok(format!("Error listing tables: {m}")),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct DescribeTableTool {
    client: Arc<DatabaseClient>,
}

impl DescribeTableTool {
    pub fn new(client: Arc<DatabaseClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for DescribeTableTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "describe_table".into(),
            description: "Get the structure (columns, data types) of a specific table. \
                          Use this to understand what columns a table has before making queries. \
                          You need to provide the exact table name."
                .into(),
            parameters: object_schema(
                &[(
                    "table_name",
                    "Name of the table to describe (e.g., 'users', 'products')",
                )],
                &["table_name"],
            ),
        }
    }

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String, ToolError> {
        let Some(table) = string_arg(arguments, "table_name")? else {
            return Ok(MISSING_TABLE.into());
        };
        ensure_connected(&self.client)?;

        let columns = match self.client.describe_table(&table).await {
            Ok(columns) => columns,
            Err(DbError::Query(m)) => return Ok(format!("Error describing table: {m}")),
            Err(e) => return Err(e.into()),
        };

        if columns.is_empty() {
            return Ok(format!("Table '{table}' does not exist or is empty."));
        }

        let mut lines = vec![format!("Structure of table '{table}':")];
        for col in &columns {
            let field = col.text("Field").unwrap_or_default();
            let ty = col.text("Type").unwrap_or_default();
            let null = if col.text("Null").as_deref() == Some("YES") {
                "NULL"
            } else {
                "NOT NULL"
            };
            let key = col
                .text("Key")
                .filter(|k| !k.is_empty())
                .map(|k| format!(" ({k})"))
                .unwrap_or_default();
            lines.push(format!("  - {field}: {ty} {null}{key}"));
        }
        Ok(lines.join("\n"))
    }
}

pub struct QueryDatabaseTool {
    client: Arc<DatabaseClient>,
}

impl QueryDatabaseTool {
    pub fn new(client: Arc<DatabaseClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for QueryDatabaseTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "query_database".into(),
            description: "Execute a SQL SELECT query on the MariaDB database. \
                          Use this tool when the user asks for specific data. \
                          IMPORTANT: Only read queries (SELECT) are allowed. \
                          First use 'list_database_tables' to see available tables \
                          and 'describe_table' to know the structure before making complex queries."
                .into(),
            parameters: object_schema(
                &[(
                    "query",
                    "The SQL SELECT query to execute. Example: 'SELECT * FROM users LIMIT 10'",
                )],
                &["query"],
            ),
        }
    }

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String, ToolError> {
        let Some(query) = string_arg(arguments, "query")? else {
            return Ok("Error: You must provide a SQL query.".into());
        };
        ensure_connected(&self.client)?;

        match self.client.execute(&query, &[]).await {
            Ok(rows) if rows.is_empty() => Ok("The query returned no results.".into()),
            Ok(rows) => Ok(format_rows(&rows)),
            Err(DbError::Query(m)) => Ok(format!("Error executing query: {m}")),
            Err(e) => {
                if matches!(e, DbError::SecurityRejected(_) | DbError::MultipleStatements) {
                    warn!(%query, error = %e, "rejected query from model");
                }
                Err(e.into())
            }
        }
    }
}

pub struct GetTableCountTool {
    client: Arc<DatabaseClient>,
}

impl GetTableCountTool {
    pub fn new(client: Arc<DatabaseClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetTableCountTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_table_count".into(),
            description: "Get the total number of records (rows) in a table. \
                          Use this tool when the user asks 'how many?' about a specific entity."
                .into(),
            parameters: object_schema(
                &[(
                    "table_name",
                    "Name of the table to count (e.g., 'users', 'orders')",
                )],
                &["table_name"],
            ),
        }
    }

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String, ToolError> {
        let Some(table) = string_arg(arguments, "table_name")? else {
            return Ok(MISSING_TABLE.into());
        };
        ensure_connected(&self.client)?;

        match self.client.get_table_count(&table).await {
            Ok(count) => Ok(format!("Table '{table}' has {count} records.")),
            Err(DbError::Query(m)) => Ok(format!("Error counting records: {m}")),
            Err(e) => Err(e.into()),
        }
    }
}
