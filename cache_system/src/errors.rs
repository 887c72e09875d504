//! Error types for cache operations
//!
//! This module defines all error types that can occur
//! while building keys or (de)serializing cached values.

use thiserror::Error;

/// Cache system errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid TTL value: {0:?}")]
    InvalidTtl(std::time::Duration),

    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}
