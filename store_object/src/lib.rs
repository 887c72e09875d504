//! Store Object - database access layer for Pulseboard
//!
//! This crate provides the connection backends, the parameterized query
//! builder, the generic record store and validation utilities.

pub mod connection;
pub mod db_utils;
pub mod errors;
pub mod prelude;
pub mod query_builder;
pub mod record_store;
pub mod validation;

pub use cache_system::CacheParams;
pub use connection::{
    query_with_timeout, BackendKind, ExecuteResult, QueryExecutor, Row, Statement,
};
pub use errors::StoreError;
pub use query_builder::{
    FilterSet, PageRequest, PaginatedResult, QueryBuilder, QueryFilter, QueryOperator, MAX_PAGE,
    QueryParams, SortOrder, SqlFragment,
};
pub use record_store::RecordStore;
pub use validation::{ValidatedFieldName, ValidatedTableName, ValidationError};
