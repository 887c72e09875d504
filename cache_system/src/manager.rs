//! Query result cache implementation
//!
//! This module provides the main QueryCache struct, an in-process
//! LRU cache with per-entry TTL built on moka.

use crate::errors::CacheError;
use config::CacheConfig;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use moka::Expiry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;
use std::future::Future;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    ttl: Duration,
}

/// Expiry policy: every entry carries its own TTL, optionally refreshed on read
struct EntryExpiry {
    update_age_on_get: bool,
}

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_read(
        &self,
        _key: &String,
        value: &CacheEntry,
        _read_at: Instant,
        duration_until_expiry: Option<Duration>,
        _last_modified_at: Instant,
    ) -> Option<Duration> {
        if self.update_age_on_get {
            Some(value.ttl)
        } else {
            duration_until_expiry
        }
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Point-in-time cache occupancy
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: u64,
    pub capacity: u64,
    /// Percentage of capacity in use
    pub utilization: f64,
}

/// LRU result cache keyed by `table:method:params`
#[derive(Clone)]
pub struct QueryCache {
    cache: Cache<String, CacheEntry>,
    config: CacheConfig,
}

impl Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("config", &self.config)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl QueryCache {
    /// Create a new cache
    pub fn new(config: CacheConfig) -> Result<Self, CacheError> {
        if config.max_entries == 0 {
            return Err(CacheError::InvalidConfig(
                "max_entries must be greater than 0".to_string(),
            ));
        }
        if config.default_ttl_seconds == 0 {
            return Err(CacheError::InvalidTtl(config.default_ttl()));
        }

        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .eviction_policy(EvictionPolicy::lru())
            .expire_after(EntryExpiry {
                update_age_on_get: config.update_age_on_get,
            })
            .build();

        Ok(Self { cache, config })
    }

    /// Generate cache key for a call
    pub fn build_key<P: Serialize + ?Sized>(
        table: &str,
        method: &str,
        params: &P,
    ) -> Result<String, CacheError> {
        Ok(format!(
            "{}:{}:{}",
            table,
            method,
            serde_json::to_string(params)?
        ))
    }

    /// Look up a cached result; `None` on miss or expiry
    pub fn get<T, P>(&self, table: &str, method: &str, params: &P) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let key = Self::build_key(table, method, params)?;

        match self.cache.get(&key) {
            Some(entry) => Ok(Some(serde_json::from_value(entry.value)?)),
            None => Ok(None),
        }
    }

    /// Store a result, with an optional TTL overriding the configured default
    pub fn set<T, P>(
        &self,
        table: &str,
        method: &str,
        params: &P,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>
    where
        T: Serialize + ?Sized,
        P: Serialize + ?Sized,
    {
        let ttl = ttl.unwrap_or_else(|| self.config.default_ttl());
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl(ttl));
        }

        let key = Self::build_key(table, method, params)?;
        let entry = CacheEntry {
            value: serde_json::to_value(value)?,
            ttl,
        };
        self.cache.insert(key, entry);
        Ok(())
    }

    /// Delete one cached result
    pub fn delete<P: Serialize + ?Sized>(
        &self,
        table: &str,
        method: &str,
        params: &P,
    ) -> Result<bool, CacheError> {
        let key = Self::build_key(table, method, params)?;
        Ok(self.cache.remove(&key).is_some())
    }

    /// Invalidate every entry belonging to a table (call after writes)
    pub fn clear_table(&self, table: &str) -> usize {
        let prefix = format!("{}:", table);
        let keys: Vec<_> = self
            .cache
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| key)
            .collect();

        for key in &keys {
            self.cache.invalidate(key.as_str());
        }

        tracing::debug!(table, removed = keys.len(), "cleared table cache");
        keys.len()
    }

    /// Drop everything
    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks();
        let size = self.cache.entry_count();
        let capacity = self.config.max_entries;
        CacheStats {
            size,
            capacity,
            utilization: size as f64 * 100.0 / capacity as f64,
        }
    }

    /// Get-or-compute: return the cached value or run `query_fn` and store an `Ok` result.
    ///
    /// Concurrent misses on the same key each run `query_fn`. Cache failures are logged
    /// and treated as misses so the query result is always returned.
    pub async fn wrap<T, P, F, Fut, E>(
        &self,
        table: &str,
        method: &str,
        params: &P,
        ttl: Option<Duration>,
        query_fn: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        P: Serialize + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.get::<T, P>(table, method, params) {
            Ok(Some(hit)) => return Ok(hit),
            Ok(None) => {}
            Err(e) => tracing::warn!(table, method, error = %e, "cache lookup failed"),
        }

        let value = query_fn().await?;

        if let Err(e) = self.set(table, method, params, &value, ttl) {
            tracing::warn!(table, method, error = %e, "cache store failed");
        }

        Ok(value)
    }

    /// Get current configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> QueryCache {
        QueryCache::new(CacheConfig::new(10, 300, true)).unwrap()
    }

    #[test]
    fn test_key_format() {
        let key = QueryCache::build_key("kol", "getAll", &json!({"limit": 5})).unwrap();
        assert_eq!(key, r#"kol:getAll:{"limit":5}"#);
    }

    #[test]
    fn test_set_then_get_round_trip() {
        let cache = cache();
        let rows = json!([{"id": 1, "name": "a"}]);
        cache.set("kol", "getAll", &json!([]), &rows, None).unwrap();

        let hit: Option<Value> = cache.get("kol", "getAll", &json!([])).unwrap();
        assert_eq!(hit, Some(rows));

        let miss: Option<Value> = cache.get("kol", "getAll", &json!([1])).unwrap();
        assert_eq!(miss, None);
    }

    #[test]
    fn test_clear_table_only_touches_prefix() {
        let cache = cache();
        cache.set("kol", "getAll", &(), &1, None).unwrap();
        cache.set("kol", "getCount", &(), &2, None).unwrap();
        cache.set("kol_extra", "getAll", &(), &3, None).unwrap();

        assert_eq!(cache.clear_table("kol"), 2);
        assert_eq!(cache.get::<i32, _>("kol", "getAll", &()).unwrap(), None);
        assert_eq!(cache.get::<i32, _>("kol", "getCount", &()).unwrap(), None);
        assert_eq!(cache.get::<i32, _>("kol_extra", "getAll", &()).unwrap(), Some(3));
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = cache();
        cache
            .set("t", "m", &(), &"v", Some(Duration::from_millis(1)))
            .unwrap();
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get::<String, _>("t", "m", &()).unwrap(), None);
    }

    fn read_at_deadline(update_age_on_get: bool) -> Option<String> {
        let cache = QueryCache::new(CacheConfig::new(10, 300, update_age_on_get)).unwrap();
        let ttl = Duration::from_millis(400);
        cache.set("t", "m", &(), &"v", Some(ttl)).unwrap();

        std::thread::sleep(Duration::from_millis(250));
        assert_eq!(
            cache.get::<String, _>("t", "m", &()).unwrap().as_deref(),
            Some("v")
        );

        // Past the original deadline, inside a TTL counted from the read
        std::thread::sleep(Duration::from_millis(250));
        cache.get::<String, _>("t", "m", &()).unwrap()
    }

    #[test]
    fn test_read_refreshes_ttl() {
        assert_eq!(read_at_deadline(true).as_deref(), Some("v"));
    }

    #[test]
    fn test_read_keeps_original_deadline_without_refresh() {
        assert_eq!(read_at_deadline(false), None);
    }

    #[test]
    fn test_eviction_drops_least_recently_used() {
        let cache = QueryCache::new(CacheConfig::new(3, 300, true)).unwrap();
        for key in ["a", "b", "c"] {
            cache.set("t", key, &(), &key, None).unwrap();
        }
        cache.cache.run_pending_tasks();

        assert!(cache.get::<String, _>("t", "a", &()).unwrap().is_some());
        cache.cache.run_pending_tasks();

        cache.set("t", "d", &(), &"d", None).unwrap();
        cache.cache.run_pending_tasks();

        assert_eq!(cache.get::<String, _>("t", "b", &()).unwrap(), None);
        for key in ["a", "c", "d"] {
            assert_eq!(
                cache.get::<String, _>("t", key, &()).unwrap().as_deref(),
                Some(key),
                "{key} should survive"
            );
        }
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let cache = cache();
        let err = cache.set("t", "m", &(), &1, Some(Duration::ZERO)).unwrap_err();
        assert!(matches!(err, CacheError::InvalidTtl(_)));
    }

    #[test]
    fn test_delete_and_clear() {
        let cache = cache();
        cache.set("t", "a", &(), &1, None).unwrap();
        cache.set("t", "b", &(), &2, None).unwrap();

        assert!(cache.delete("t", "a", &()).unwrap());
        assert!(!cache.delete("t", "a", &()).unwrap());

        cache.clear();
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_capacity_bound() {
        let cache = QueryCache::new(CacheConfig::new(3, 300, true)).unwrap();
        for i in 0..20 {
            cache.set("t", "m", &i, &i, None).unwrap();
        }
        let stats = cache.stats();
        assert!(stats.size <= 3, "size {} exceeds capacity", stats.size);
        assert_eq!(stats.capacity, 3);
    }

    #[test]
    fn test_stats_utilization() {
        let cache = cache();
        cache.set("t", "a", &(), &1, None).unwrap();
        cache.set("t", "b", &(), &2, None).unwrap();
        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert!((stats.utilization - 20.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_wrap_computes_once_then_hits() {
        let cache = cache();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<Vec<i32>, String> = cache
                .wrap("t", "list", &json!({"page": 1}), None, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await;
            assert_eq!(value.unwrap(), vec![1, 2, 3]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wrap_does_not_store_errors() {
        let cache = cache();

        let failed: Result<i32, String> = cache
            .wrap("t", "m", &(), None, || async { Err("boom".to_string()) })
            .await;
        assert_eq!(failed, Err("boom".to_string()));

        let recovered: Result<i32, String> =
            cache.wrap("t", "m", &(), None, || async { Ok(7) }).await;
        assert_eq!(recovered, Ok(7));
    }
}
