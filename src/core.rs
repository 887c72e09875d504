//! Application context
//!
//! [`AppContext`] owns the database handle, the shared result cache and one
//! instance of every entity service. It is built once at startup and cloned
//! cheaply into request handlers.

use std::sync::Arc;
use std::time::Duration;

use cache_system::{CacheParams, QueryCache};
use config::AppConfig;
use serde_json::Value;
use store_object::connection::open;
use store_object::{query_with_timeout, BackendKind, QueryExecutor, StoreError};
use tracing::info;

use crate::errors::PulseboardError;
use crate::migration::FALLBACK_SCHEMA;
use crate::services::{
    AdService, ConsumerVoiceService, InsightSearchService, Kol2024Service, KolService,
    PrivateChannelService, SelfMediaService, ServiceOptions, TestingService,
    TikTokCreatorService, TikTokProductService,
};

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

struct Inner {
    config: AppConfig,
    executor: Arc<dyn QueryExecutor>,
    cache: Arc<QueryCache>,
    kol: KolService,
    kol_2024: Kol2024Service,
    insight: InsightSearchService,
    creators: TikTokCreatorService,
    products: TikTokProductService,
    consumer_voice: ConsumerVoiceService,
    self_media: SelfMediaService,
    ads: AdService,
    private_channels: PrivateChannelService,
    testing: TestingService,
}

#[derive(Clone)]
pub struct AppContext {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("backend", &self.inner.executor.backend())
            .field("cache", &self.inner.cache.stats())
            .finish()
    }
}

impl AppContext {
    /// Open the configured database backend and build every service on it
    pub async fn new(config: AppConfig) -> Result<Self, PulseboardError> {
        let executor = open(&config.database, FALLBACK_SCHEMA).await?;
        info!(backend = %executor.backend(), "database opened");
        Self::with_executor(config, executor)
    }

    /// Build the context on an already opened executor
    pub fn with_executor(config: AppConfig, executor: Arc<dyn QueryExecutor>) -> Result<Self, PulseboardError> {
        let cache = Arc::new(QueryCache::new(config.cache.clone())?);
        let options = ServiceOptions {
            cache: Some(CacheParams::new(Arc::clone(&cache)).with_ttl(config.cache.default_ttl())),
            timeout: Some(config.database.query_timeout()),
        };

        let inner = Inner {
            kol: KolService::new(Arc::clone(&executor), &options)?,
            kol_2024: Kol2024Service::new(Arc::clone(&executor), &options)?,
            insight: InsightSearchService::new(Arc::clone(&executor), &options)?,
            creators: TikTokCreatorService::new(Arc::clone(&executor), &options)?,
            products: TikTokProductService::new(Arc::clone(&executor), &options)?,
            consumer_voice: ConsumerVoiceService::new(Arc::clone(&executor), &options)?,
            self_media: SelfMediaService::new(Arc::clone(&executor), &options)?,
            ads: AdService::new(),
            private_channels: PrivateChannelService::new(),
            testing: TestingService::new(),
            config,
            executor,
            cache,
        };
        Ok(Self { inner: Arc::new(inner) })
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn executor(&self) -> &Arc<dyn QueryExecutor> {
        &self.inner.executor
    }

    pub fn backend(&self) -> BackendKind {
        self.inner.executor.backend()
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.inner.cache
    }

    pub fn kol(&self) -> &KolService {
        &self.inner.kol
    }

    pub fn kol_2024(&self) -> &Kol2024Service {
        &self.inner.kol_2024
    }

    pub fn insight(&self) -> &InsightSearchService {
        &self.inner.insight
    }

    pub fn creators(&self) -> &TikTokCreatorService {
        &self.inner.creators
    }

    pub fn products(&self) -> &TikTokProductService {
        &self.inner.products
    }

    pub fn consumer_voice(&self) -> &ConsumerVoiceService {
        &self.inner.consumer_voice
    }

    pub fn self_media(&self) -> &SelfMediaService {
        &self.inner.self_media
    }

    pub fn ads(&self) -> &AdService {
        &self.inner.ads
    }

    pub fn private_channels(&self) -> &PrivateChannelService {
        &self.inner.private_channels
    }

    pub fn testing(&self) -> &TestingService {
        &self.inner.testing
    }

    /// Run `SELECT 1` against the database, bounded by a five second timeout
    pub async fn health_check(&self) -> Result<(), StoreError> {
        let row = query_with_timeout(
            self.inner.executor.query_one("SELECT 1 AS test", &[]),
            HEALTH_CHECK_TIMEOUT,
        )
        .await?;
        match row.as_ref().and_then(|r| r.get("test")).and_then(Value::as_i64) {
            Some(1) => Ok(()),
            _ => Err(StoreError::DatabaseError("health check returned no row".to_string())),
        }
    }

    /// Release the database handle
    pub async fn close(&self) {
        self.inner.executor.close().await;
        info!("database closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::kol::KolFilter;
    use store_object::connection::SqliteExecutor;
    use store_object::PageRequest;

    async fn context() -> AppContext {
        let executor = SqliteExecutor::open_memory().await.unwrap();
        executor.run_script(FALLBACK_SCHEMA).await.unwrap();
        AppContext::with_executor(AppConfig::default(), Arc::new(executor)).unwrap()
    }

    #[tokio::test]
    async fn test_health_check_and_backend() {
        let context = context().await;
        assert!(context.health_check().await.is_ok());
        assert_eq!(context.backend(), BackendKind::Memory);
    }

    #[tokio::test]
    async fn test_services_share_the_cache() {
        let context = context().await;
        let page = PageRequest::default();

        context.kol().list_accounts(&KolFilter::default(), page).await.unwrap();
        assert!(context.cache().stats().size > 0);

        let clone = context.clone();
        assert_eq!(clone.cache().stats().size, context.cache().stats().size);
    }

    #[tokio::test]
    async fn test_close_makes_queries_fail() {
        let context = context().await;
        context.close().await;
        assert!(context.health_check().await.is_err());
    }
}
