//! Entity services
//!
//! Each service composes one or more [`RecordStore`]s with the filters, default
//! ordering and response shapes of its entity. Services return every failure;
//! degrading to demo data is decided by the caller through [`OrFallback`].

pub mod ads;
pub mod consumer_voice;
pub mod fallback;
pub mod insight_search;
pub mod kol;
pub mod kol_2024;
pub mod private_channel;
pub mod self_media;
pub mod testing;
pub mod tiktok_creator;
pub mod tiktok_product;

pub use ads::AdService;
pub use consumer_voice::ConsumerVoiceService;
pub use fallback::OrFallback;
pub use insight_search::InsightSearchService;
pub use kol::KolService;
pub use kol_2024::Kol2024Service;
pub use private_channel::PrivateChannelService;
pub use self_media::SelfMediaService;
pub use testing::TestingService;
pub use tiktok_creator::TikTokCreatorService;
pub use tiktok_product::TikTokProductService;

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use store_object::{CacheParams, QueryExecutor, RecordStore, Row, StoreError};

/// Shared settings for every store a service opens
#[derive(Debug, Clone, Default)]
pub struct ServiceOptions {
    pub cache: Option<CacheParams>,
    pub timeout: Option<Duration>,
}

impl ServiceOptions {
    pub(crate) fn store<T>(
        &self,
        executor: &Arc<dyn QueryExecutor>,
        table: &str,
    ) -> Result<RecordStore<T>, StoreError> {
        let mut store = RecordStore::new(Arc::clone(executor), table)?;
        if let Some(cache) = &self.cache {
            store = store.with_cache(cache.clone());
        }
        if let Some(timeout) = self.timeout {
            store = store.with_timeout(timeout);
        }
        Ok(store)
    }
}

/// Read a numeric column, treating NULL or absence as zero
pub(crate) fn number(row: &Row, column: &str) -> f64 {
    row.get(column).and_then(Value::as_f64).unwrap_or(0.0)
}

pub(crate) fn integer(row: &Row, column: &str) -> i64 {
    match row.get(column) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or_else(|| n.as_f64().unwrap_or(0.0) as i64),
        _ => 0,
    }
}

/// Round to `digits` decimal places
pub(crate) fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::migration::FALLBACK_SCHEMA;
    use std::sync::Arc;
    use store_object::connection::SqliteExecutor;
    use store_object::QueryExecutor;

    /// In-memory database seeded with the fallback schema
    pub async fn seeded_executor() -> Arc<dyn QueryExecutor> {
        let executor = SqliteExecutor::open_memory().await.unwrap();
        executor.run_script(FALLBACK_SCHEMA).await.unwrap();
        Arc::new(executor)
    }

    /// In-memory database without any tables, so every query fails
    pub async fn empty_executor() -> Arc<dyn QueryExecutor> {
        Arc::new(SqliteExecutor::open_memory().await.unwrap())
    }
}
