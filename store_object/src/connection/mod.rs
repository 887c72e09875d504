//! Database connection layer
//!
//! One [`QueryExecutor`] is opened per process and shared by every store.
//! Three backends implement it: a read-only local SQLite file, a seeded
//! in-memory SQLite database and the hosted libSQL HTTP API.

pub mod provider;
pub mod remote;
pub mod sqlite;

use crate::errors::StoreError;
use crate::query_builder::SqlFragment;
use crate::validation::{ValidatedFieldName, ValidatedTableName};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;

pub use provider::{open, select_backend, BackendChoice};
pub use remote::RemoteExecutor;
pub use sqlite::SqliteExecutor;

/// A result row keyed by column name
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Local,
    Memory,
    Remote,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BackendKind::Local => "local",
            BackendKind::Memory => "memory",
            BackendKind::Remote => "remote",
        };
        f.write_str(name)
    }
}

/// Outcome of a mutating statement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResult {
    pub changes: u64,
    pub last_insert_rowid: Option<i64>,
}

/// A statement queued for a transaction batch
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl From<SqlFragment> for Statement {
    fn from(fragment: SqlFragment) -> Self {
        let (sql, params) = fragment.into_parts();
        Self { sql, params }
    }
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Which backend serves the queries
    fn backend(&self) -> BackendKind;

    /// Run a read statement and return every row
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, StoreError>;

    /// First row of a read statement, if any
    async fn query_one(&self, sql: &str, params: &[Value]) -> Result<Option<Row>, StoreError> {
        Ok(self.query(sql, params).await?.into_iter().next())
    }

    /// Run a mutating statement
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecuteResult, StoreError>;

    /// Run every statement atomically; nothing is kept when one fails
    async fn transaction(
        &self,
        statements: Vec<Statement>,
    ) -> Result<Vec<ExecuteResult>, StoreError>;

    /// Insert many rows in one transaction
    async fn batch_insert(
        &self,
        table: &str,
        columns: &[&str],
        rows: Vec<Vec<Value>>,
    ) -> Result<Vec<ExecuteResult>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let table = ValidatedTableName::new(table)?;
        let quoted_columns = columns
            .iter()
            .map(|c| ValidatedFieldName::new(c).map(|f| f.quoted()))
            .collect::<Result<Vec<_>, _>>()?;
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.quoted(),
            quoted_columns.join(", "),
            placeholders
        );

        let statements = rows
            .into_iter()
            .map(|row| {
                if row.len() != columns.len() {
                    return Err(StoreError::ValidationError(format!(
                        "row has {} values for {} columns",
                        row.len(),
                        columns.len()
                    )));
                }
                Ok(Statement::new(sql.clone(), row))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.transaction(statements).await
    }

    /// Release the underlying handle. Calling it again is a no-op.
    async fn close(&self);
}

/// Race `future` against a timer. On expiry the caller stops waiting but the
/// query itself keeps running.
pub async fn query_with_timeout<T, F>(future: F, limit: Duration) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_statement_from_fragment() {
        let fragment = SqlFragment::new("DELETE FROM t WHERE id = ?", vec![json!(3)]).unwrap();
        let statement = Statement::from(fragment);
        assert_eq!(statement.sql, "DELETE FROM t WHERE id = ?");
        assert_eq!(statement.params, vec![json!(3)]);
    }

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(BackendKind::Memory.to_string(), "memory");
        assert_eq!(serde_json::to_value(BackendKind::Remote).unwrap(), json!("remote"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_with_timeout_expires() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, StoreError>(1)
        };
        let err = query_with_timeout(slow, Duration::from_millis(250))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Timeout(250)));
    }

    #[tokio::test]
    async fn test_query_with_timeout_passes_result() {
        let fast = async { Ok::<_, StoreError>(7) };
        assert_eq!(query_with_timeout(fast, Duration::from_secs(1)).await.unwrap(), 7);
    }
}
