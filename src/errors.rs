//! Error types for the Pulseboard crate
//!
//! This module contains the errors returned while building the application
//! context and by the entity services.

use cache_system::CacheError;
use config::ConfigError;
use store_object::StoreError;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum PulseboardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Cache setup error: {0}")]
    Cache(#[from] CacheError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

impl PulseboardError {
    /// Whether the failure comes from the database being unreachable or overloaded
    pub fn is_unavailable(&self) -> bool {
        matches!(self, PulseboardError::Store(e) if e.is_unavailable())
    }
}
