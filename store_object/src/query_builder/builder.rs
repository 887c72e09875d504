//! Query builder utilities
//!
//! This module provides SQL query construction utilities.

use crate::query_builder::filter::QueryFilter;
use crate::query_builder::fragment::SqlFragment;
use crate::query_builder::ordering::{OrderBy, SortOrder};
use crate::query_builder::pagination::Pagination;
use crate::query_builder::sql_generation::SqlGenerator;

/// Query builder for constructing filtered, ordered and paged SELECTs
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    pub(crate) conditions: Vec<QueryFilter>,
    pub(crate) order_by: Vec<OrderBy>,
    pub(crate) pagination: Pagination,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter condition
    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.conditions.push(filter);
        self
    }

    /// Add multiple filters (combined with AND)
    pub fn filters(mut self, filters: Vec<QueryFilter>) -> Self {
        self.conditions.extend(filters);
        self
    }

    /// Add ordering
    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by.push(OrderBy::new(field, order));
        self
    }

    /// Add limit
    pub fn limit(mut self, limit: i64) -> Self {
        self.pagination.limit = Some(limit);
        self
    }

    /// Add offset
    pub fn offset(mut self, offset: i64) -> Self {
        self.pagination.offset = Some(offset);
        self
    }

    /// Build WHERE conditions (without the keyword)
    pub fn build_where_clause(&self) -> SqlFragment {
        SqlGenerator::build_where_clause(&self.conditions)
    }

    /// Build ORDER BY clause
    pub fn build_order_clause(&self) -> String {
        SqlGenerator::build_order_clause(&self.order_by)
    }

    /// Build LIMIT/OFFSET clause
    pub fn build_limit_clause(&self) -> SqlFragment {
        SqlGenerator::build_limit_clause(self.pagination.limit, self.pagination.offset)
    }

    /// Build the complete statement against `table`
    pub fn build_select(&self, select: &str, table: &str) -> SqlFragment {
        let where_clause = self.build_where_clause();
        let mut statement = SqlGenerator::build_select(
            select,
            table,
            Some(&where_clause),
            &[&self.build_order_clause()],
        );
        statement.push(" ", self.build_limit_clause());
        statement
    }
}

/// Ordering and paging options for a plain fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    /// Trusted column expression
    pub order_by: Option<String>,
    pub order: Option<SortOrder>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order_by = Some(column.into());
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// `ORDER BY column ASC|DESC`, ascending unless stated
    pub fn order_clause(&self) -> String {
        match &self.order_by {
            Some(column) => SqlGenerator::build_order_clause(&[OrderBy::new(
                column.clone(),
                self.order.unwrap_or_default(),
            )]),
            None => String::new(),
        }
    }

    pub fn limit_clause(&self) -> SqlFragment {
        SqlGenerator::build_limit_clause(self.limit, self.offset)
    }
}
