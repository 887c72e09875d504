//! SQLite backends: a read-only file and a seeded in-memory database

use super::{BackendKind, ExecuteResult, QueryExecutor, Row, Statement};
use crate::errors::StoreError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, TypeInfo, ValueRef};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

// Shared JSON -> SQLite parameter binding
macro_rules! bind_json_param {
    ($query:expr, $param:expr) => {
        match $param {
            serde_json::Value::String(s) => $query.bind(s.clone()),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    $query.bind(i)
                } else if let Some(f) = n.as_f64() {
                    $query.bind(f)
                } else {
                    $query.bind(n.to_string())
                }
            }
            serde_json::Value::Bool(b) => $query.bind(*b),
            serde_json::Value::Null => $query.bind(Option::<String>::None),
            other => $query.bind(other.to_string()),
        }
    };
}

fn bind_params<'q>(mut query: SqliteQuery<'q>, params: &[Value]) -> SqliteQuery<'q> {
    for param in params {
        query = bind_json_param!(query, param);
    }
    query
}

/// Convert a row column by column using the value's storage class
fn row_to_json(row: &SqliteRow) -> Result<Row, StoreError> {
    let mut object = Row::new();

    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let storage = raw.type_info().name().to_ascii_uppercase();
            match storage.as_str() {
                "INTEGER" | "INT8" | "BIGINT" | "BOOLEAN" => {
                    Value::from(row.try_get_unchecked::<i64, _>(index)?)
                }
                "REAL" | "FLOAT" | "DOUBLE" => {
                    let number = row.try_get_unchecked::<f64, _>(index)?;
                    serde_json::Number::from_f64(number)
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
                "BLOB" => {
                    let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
                    Value::String(STANDARD.encode(bytes))
                }
                "TEXT" => Value::String(row.try_get_unchecked::<String, _>(index)?),
                _ => fallback_decode(row, index),
            }
        };
        object.insert(column.name().to_string(), value);
    }

    Ok(object)
}

fn fallback_decode(row: &SqliteRow, index: usize) -> Value {
    if let Ok(i) = row.try_get_unchecked::<i64, _>(index) {
        Value::from(i)
    } else if let Ok(f) = row.try_get_unchecked::<f64, _>(index) {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    } else if let Ok(s) = row.try_get_unchecked::<String, _>(index) {
        Value::String(s)
    } else {
        Value::Null
    }
}

/// Executor over a sqlx SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
    kind: BackendKind,
}

impl SqliteExecutor {
    /// Open an existing database file read-only. Any open failure is reported
    /// as [`StoreError::Unavailable`] so the caller can fall back.
    pub async fn open_local(
        path: impl AsRef<Path>,
        busy_timeout: Duration,
        max_connections: u32,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .busy_timeout(busy_timeout)
            .foreign_keys(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| {
                StoreError::Unavailable(format!("cannot open {}: {}", path.display(), e))
            })?;

        info!(path = %path.display(), "Opened local database (read-only)");
        Ok(Self {
            pool,
            kind: BackendKind::Local,
        })
    }

    /// Open an empty in-memory database. The pool keeps exactly one connection
    /// alive for the process lifetime since every connection would otherwise
    /// see its own database.
    pub async fn open_memory() -> Result<Self, StoreError> {
        let options = "sqlite::memory:"
            .parse::<SqliteConnectOptions>()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(format!("cannot open in-memory database: {}", e)))?;

        Ok(Self {
            pool,
            kind: BackendKind::Memory,
        })
    }

    /// Run a multi-statement script such as schema DDL plus seed rows
    pub async fn run_script(&self, script: &str) -> Result<(), StoreError> {
        sqlx::raw_sql(script)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::query_failed("run_script", e))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    fn backend(&self) -> BackendKind {
        self.kind
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, StoreError> {
        debug!(backend = %self.kind, sql, params = params.len(), "query");
        let rows = bind_params(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::query_failed("query", e))?;

        rows.iter().map(row_to_json).collect()
    }

    async fn query_one(&self, sql: &str, params: &[Value]) -> Result<Option<Row>, StoreError> {
        let row = bind_params(sqlx::query(sql), params)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::query_failed("query_one", e))?;

        row.as_ref().map(row_to_json).transpose()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecuteResult, StoreError> {
        debug!(backend = %self.kind, sql, params = params.len(), "execute");
        let result = bind_params(sqlx::query(sql), params)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::query_failed("execute", e))?;

        Ok(ExecuteResult {
            changes: result.rows_affected(),
            last_insert_rowid: Some(result.last_insert_rowid()),
        })
    }

    async fn transaction(
        &self,
        statements: Vec<Statement>,
    ) -> Result<Vec<ExecuteResult>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::query_failed("begin transaction", e))?;

        let mut results = Vec::with_capacity(statements.len());
        for statement in &statements {
            // Dropping `tx` on error rolls back
            let result = bind_params(sqlx::query(&statement.sql), &statement.params)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::query_failed("transaction", e))?;
            results.push(ExecuteResult {
                changes: result.rows_affected(),
                last_insert_rowid: Some(result.last_insert_rowid()),
            });
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::query_failed("commit transaction", e))?;
        Ok(results)
    }

    async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            info!(backend = %self.kind, "Database connection closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn memory_with_table() -> SqliteExecutor {
        let executor = SqliteExecutor::open_memory().await.unwrap();
        executor
            .run_script(
                "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, price REAL, raw BLOB);
                 INSERT INTO items (id, name, price, raw) VALUES (1, 'speaker', 49.5, x'0102');",
            )
            .await
            .unwrap();
        executor
    }

    #[tokio::test]
    async fn test_row_decoding_by_storage_class() {
        let executor = memory_with_table().await;
        let row = executor
            .query_one("SELECT * FROM items WHERE id = ?", &[json!(1)])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(row["id"], json!(1));
        assert_eq!(row["name"], json!("speaker"));
        assert_eq!(row["price"], json!(49.5));
        assert_eq!(row["raw"], json!("AQI="));
    }

    #[tokio::test]
    async fn test_null_and_bool_params() {
        let executor = memory_with_table().await;
        let result = executor
            .execute(
                "INSERT INTO items (name, price) VALUES (?, ?)",
                &[Value::Null, json!(true)],
            )
            .await
            .unwrap();
        assert_eq!(result.changes, 1);
        assert_eq!(result.last_insert_rowid, Some(2));

        let rows = executor
            .query("SELECT name, price FROM items WHERE name IS NULL", &[])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], Value::Null);
        assert_eq!(rows[0]["price"], json!(1.0));
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_failure() {
        let executor = memory_with_table().await;
        let err = executor
            .transaction(vec![
                Statement::new("INSERT INTO items (id, name) VALUES (?, ?)", vec![json!(10), json!("a")]),
                Statement::new("INSERT INTO missing_table (x) VALUES (?)", vec![json!(1)]),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DatabaseError(_)));

        let rows = executor
            .query("SELECT id FROM items WHERE id = ?", &[json!(10)])
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_batch_insert_checks_row_width() {
        let executor = memory_with_table().await;
        let results = executor
            .batch_insert(
                "items",
                &["name", "price"],
                vec![vec![json!("a"), json!(1.0)], vec![json!("b"), json!(2.0)]],
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 2);

        let err = executor
            .batch_insert("items", &["name", "price"], vec![vec![json!("c")]])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_missing_local_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = SqliteExecutor::open_local(dir.path().join("absent.db"), Duration::from_secs(1), 2)
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_local_file_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.db");
        let writer = SqlitePoolOptions::new()
            .connect_with(SqliteConnectOptions::new().filename(&path).create_if_missing(true))
            .await
            .unwrap();
        sqlx::raw_sql("CREATE TABLE t (v INTEGER); INSERT INTO t VALUES (42);")
            .execute(&writer)
            .await
            .unwrap();
        writer.close().await;

        let executor = SqliteExecutor::open_local(&path, Duration::from_secs(1), 2)
            .await
            .unwrap();
        assert_eq!(executor.backend(), BackendKind::Local);
        let rows = executor.query("SELECT v FROM t", &[]).await.unwrap();
        assert_eq!(rows[0]["v"], json!(42));
        assert!(executor.execute("INSERT INTO t VALUES (1)", &[]).await.is_err());

        executor.close().await;
        executor.close().await;
    }
}
