//! Schema and size inspection helpers

use crate::connection::{QueryExecutor, Row};
use crate::errors::StoreError;
use crate::validation::ValidatedTableName;
use serde::Serialize;
use serde_json::{json, Value};

/// One column as reported by `pragma_table_info`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub not_null: bool,
    pub default_value: Value,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStats {
    pub name: String,
    pub row_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub tables: Vec<TableStats>,
    pub total_rows: i64,
    pub size_bytes: i64,
}

fn int(row: &Row, key: &str) -> i64 {
    row.get(key).and_then(Value::as_i64).unwrap_or(0)
}

pub async fn table_exists(executor: &dyn QueryExecutor, table: &str) -> Result<bool, StoreError> {
    let row = executor
        .query_one(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            &[json!(table)],
        )
        .await?;
    Ok(row.is_some())
}

pub async fn table_schema(
    executor: &dyn QueryExecutor,
    table: &str,
) -> Result<Vec<ColumnInfo>, StoreError> {
    let rows = executor
        .query("SELECT * FROM pragma_table_info(?)", &[json!(table)])
        .await?;

    Ok(rows
        .iter()
        .map(|row| ColumnInfo {
            cid: int(row, "cid"),
            name: row.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
            column_type: row.get("type").and_then(Value::as_str).unwrap_or_default().to_string(),
            not_null: int(row, "notnull") != 0,
            default_value: row.get("dflt_value").cloned().unwrap_or(Value::Null),
            primary_key: int(row, "pk") != 0,
        })
        .collect())
}

/// Row count of every user table plus the on-disk size
pub async fn database_stats(executor: &dyn QueryExecutor) -> Result<DatabaseStats, StoreError> {
    let names = executor
        .query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            &[],
        )
        .await?;

    let mut tables = Vec::with_capacity(names.len());
    for row in &names {
        let Some(name) = row.get("name").and_then(Value::as_str) else {
            continue;
        };
        let table = ValidatedTableName::new(name)?;
        let count = executor
            .query_one(&format!("SELECT COUNT(*) AS count FROM {}", table.quoted()), &[])
            .await?
            .map(|r| int(&r, "count"))
            .unwrap_or(0);
        tables.push(TableStats {
            name: name.to_string(),
            row_count: count,
        });
    }

    let size_bytes = executor
        .query_one(
            "SELECT page_count * page_size AS size FROM pragma_page_count(), pragma_page_size()",
            &[],
        )
        .await?
        .map(|r| int(&r, "size"))
        .unwrap_or(0);

    Ok(DatabaseStats {
        total_rows: tables.iter().map(|t| t.row_count).sum(),
        tables,
        size_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::SqliteExecutor;

    async fn executor() -> SqliteExecutor {
        let executor = SqliteExecutor::open_memory().await.unwrap();
        executor
            .run_script(
                "CREATE TABLE kol (\"No.\" INTEGER PRIMARY KEY, kol_account TEXT NOT NULL, region TEXT DEFAULT 'US');
                 INSERT INTO kol (kol_account) VALUES ('a'), ('b'), ('c');
                 CREATE TABLE empty_table (id INTEGER);",
            )
            .await
            .unwrap();
        executor
    }

    #[tokio::test]
    async fn test_table_exists() {
        let executor = executor().await;
        assert!(table_exists(&executor, "kol").await.unwrap());
        assert!(!table_exists(&executor, "nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_table_schema() {
        let executor = executor().await;
        let columns = table_schema(&executor, "kol").await.unwrap();

        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].name, "No.");
        assert!(columns[0].primary_key);
        assert!(columns[1].not_null);
        assert_eq!(columns[2].default_value, json!("'US'"));
    }

    #[tokio::test]
    async fn test_database_stats() {
        let executor = executor().await;
        let stats = database_stats(&executor).await.unwrap();

        assert_eq!(stats.tables.len(), 2);
        assert_eq!(stats.tables[0].name, "empty_table");
        assert_eq!(stats.tables[1].row_count, 3);
        assert_eq!(stats.total_rows, 3);
        assert!(stats.size_bytes > 0);
    }
}
