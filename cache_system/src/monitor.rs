//! Periodic cache utilization logging

use crate::QueryCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Background task that logs cache occupancy at a fixed interval
pub struct CacheMonitor;

impl CacheMonitor {
    /// Spawn the monitor on the current tokio runtime
    pub fn spawn(cache: Arc<QueryCache>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                Self::report(&cache);
            }
        })
    }

    fn report(cache: &QueryCache) {
        let stats = cache.stats();
        tracing::info!(
            size = stats.size,
            capacity = stats.capacity,
            utilization = format!("{:.1}%", stats.utilization),
            "query cache stats"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::CacheConfig;

    #[tokio::test(start_paused = true)]
    async fn test_monitor_runs_until_aborted() {
        let cache = Arc::new(QueryCache::new(CacheConfig::default()).unwrap());
        cache.set("t", "m", &(), &1, None).unwrap();

        let handle = CacheMonitor::spawn(cache.clone(), Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(125)).await;
        assert!(!handle.is_finished());

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
