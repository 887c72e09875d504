//! Query builder utilities
//!
//! This module provides SQL query construction utilities.

pub mod aggregation;
pub mod builder;
pub mod filter;
pub mod fragment;
pub mod grouping;
pub mod ordering;
pub mod pagination;
pub mod sql_generation;

#[cfg(test)]
mod tests;

pub use aggregation::{AggregateFunction, SelectField};
pub use builder::{QueryBuilder, QueryParams};
pub use filter::{FilterSet, LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
pub use fragment::SqlFragment;
pub use grouping::GroupBy;
pub use ordering::{OrderBy, SortOrder};
pub use pagination::{total_pages, PageRequest, PaginatedResult, Pagination, MAX_PAGE};
pub use sql_generation::SqlGenerator;
