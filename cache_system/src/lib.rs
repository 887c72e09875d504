//! Cache system for memoizing query results
//!
//! This crate provides an in-process LRU result cache keyed by
//! `table:method:params`, with per-entry TTL and table-wide invalidation.

pub mod errors;
pub mod manager;
pub mod monitor;
pub mod params;
pub mod prelude;

// Re-export centralized config
pub use config::CacheConfig;

pub use errors::CacheError;
pub use manager::{CacheStats, QueryCache};
pub use monitor::CacheMonitor;
pub use params::CacheParams;
