//! Query executor trait definition.

use async_trait::async_trait;

use crate::error::ExecutionError;

/// One result row: column name to JSON value, in column order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Executes generated statements against the records database.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a read-only statement and return every row it produced.
    async fn execute_read(&self, statement: &str) -> Result<Vec<Row>, ExecutionError>;

    /// Run a mutating statement and return the number of affected rows.
    async fn execute_write(&self, statement: &str) -> Result<u64, ExecutionError>;

    /// Check that the database is reachable.
    async fn ping(&self) -> Result<(), ExecutionError>;
}
