//! Cache parameter configuration
//!
//! This module defines the CacheParams struct
//! for attaching a shared cache to a store with its own TTL.

use crate::QueryCache;
use std::sync::Arc;
use std::time::Duration;

/// Cache parameters for configuring cache behavior per store/entity
#[derive(Debug, Clone)]
pub struct CacheParams {
    /// The shared cache instance
    pub cache: Arc<QueryCache>,
    /// TTL for this store, `None` uses the cache default
    pub ttl: Option<Duration>,
}

impl CacheParams {
    pub fn new(cache: Arc<QueryCache>) -> Self {
        Self { cache, ttl: None }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}
