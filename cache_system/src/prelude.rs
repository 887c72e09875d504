//! Convenience re-exports for common cache-system usage

// Core cache system components
pub use crate::errors::CacheError;
pub use crate::manager::{CacheStats, QueryCache};
pub use crate::monitor::CacheMonitor;
pub use crate::params::CacheParams;

// Re-export centralized config
pub use config::CacheConfig;
