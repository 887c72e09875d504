//! Convenience re-exports for common store-object usage

// Connection
pub use crate::connection::{BackendKind, ExecuteResult, QueryExecutor, Row, Statement};

// Error types
pub use crate::errors::StoreError;

// Core store functionality
pub use crate::record_store::RecordStore;

// Validation
pub use crate::validation::{ValidatedFieldName, ValidatedTableName, ValidationError};

// Query building
pub use crate::query_builder::{
    AggregateFunction, FilterSet, GroupBy, OrderBy, PageRequest, PaginatedResult, QueryFilter,
    QueryParams, SelectField, SortOrder, SqlFragment, SqlGenerator,
};

// Cache params (re-exported from cache_system)
pub use crate::CacheParams;

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
