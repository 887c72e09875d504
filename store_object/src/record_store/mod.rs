//! Generic record store
//!
//! A [`RecordStore`] turns fetch requests into parameterized SQL against one
//! table. Rows decode into `T` through serde, so `T` may be a typed DTO or the
//! loosely shaped [`Row`].

mod operations;

use crate::connection::{query_with_timeout, QueryExecutor, Row};
use crate::errors::StoreError;
use crate::query_builder::SqlFragment;
use crate::validation::ValidatedTableName;
use cache_system::CacheParams;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

pub struct RecordStore<T = Row> {
    pub(crate) executor: Arc<dyn QueryExecutor>,
    pub(crate) table: ValidatedTableName,
    pub(crate) cache: Option<CacheParams>,
    pub(crate) timeout: Option<Duration>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for RecordStore<T> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            table: self.table.clone(),
            cache: self.cache.clone(),
            timeout: self.timeout,
            _phantom: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for RecordStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("table", &self.table.as_str())
            .field("backend", &self.executor.backend())
            .field("has_cache", &self.has_cache())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<T> RecordStore<T> {
    pub fn new(executor: Arc<dyn QueryExecutor>, table: &str) -> Result<Self, StoreError> {
        Ok(Self {
            executor,
            table: ValidatedTableName::new(table)?,
            cache: None,
            timeout: None,
            _phantom: PhantomData,
        })
    }

    /// Serve reads through the shared result cache
    pub fn with_cache(mut self, cache: CacheParams) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Abandon reads that take longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    pub fn table_name(&self) -> &str {
        self.table.as_str()
    }

    /// Table identifier ready for SQL text
    pub fn quoted_table(&self) -> String {
        self.table.quoted()
    }

    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.executor
    }

    /// Drop every cached result for this table
    pub fn invalidate_cache(&self) -> usize {
        self.cache
            .as_ref()
            .map(|c| c.cache.clear_table(self.table.as_str()))
            .unwrap_or(0)
    }

    async fn timed<R, F>(&self, future: F) -> Result<R, StoreError>
    where
        F: Future<Output = Result<R, StoreError>>,
    {
        match self.timeout {
            Some(limit) => query_with_timeout(future, limit).await,
            None => future.await,
        }
    }

    /// Run a read, consulting the cache under `table:method:[sql, params]`
    pub(crate) async fn fetch<R>(&self, method: &str, statement: &SqlFragment) -> Result<Vec<R>, StoreError>
    where
        R: Serialize + DeserializeOwned + Send,
    {
        let run = move || async move {
            let rows = self
                .timed(self.executor.query(statement.sql(), statement.params()))
                .await?;
            decode_rows::<R>(rows)
        };

        match &self.cache {
            Some(cache) => {
                let key = (statement.sql(), statement.params());
                cache
                    .cache
                    .wrap(self.table.as_str(), method, &key, cache.ttl, run)
                    .await
            }
            None => run().await,
        }
    }

    pub(crate) async fn fetch_one<R>(&self, method: &str, statement: &SqlFragment) -> Result<Option<R>, StoreError>
    where
        R: Serialize + DeserializeOwned + Send,
    {
        Ok(self.fetch::<R>(method, statement).await?.into_iter().next())
    }
}

pub(crate) fn decode_rows<R: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<R>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)).map_err(StoreError::from))
        .collect()
}

/// First column of the first row as a number
pub(crate) fn scalar(rows: &[Row], column: &str) -> Option<f64> {
    rows.first()
        .and_then(|row| row.get(column))
        .and_then(|value| match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
}
