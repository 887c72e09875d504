//! Read and write operations of [`RecordStore`]

use super::{scalar, RecordStore};
use crate::connection::{ExecuteResult, Row};
use crate::errors::StoreError;
use crate::query_builder::{
    AggregateFunction, GroupBy, PageRequest, PaginatedResult, QueryFilter, QueryParams,
    SelectField, SqlFragment, SqlGenerator,
};
use crate::validation::ValidatedFieldName;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

impl<T> RecordStore<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    /// `SELECT *` with optional ordering and paging, no filtering
    pub async fn get_all(&self, params: &QueryParams) -> Result<Vec<T>, StoreError> {
        let mut statement = SqlGenerator::build_select("*", &self.quoted_table(), None, &[&params.order_clause()]);
        statement.push(" ", params.limit_clause());
        self.fetch("get_all", &statement).await
    }

    /// Lookup on the `id` column
    pub async fn get_by_id(&self, id: impl Into<Value>) -> Result<Option<T>, StoreError> {
        self.get_by_key("id", id).await
    }

    /// Single-column equality lookup returning the first match
    pub async fn get_by_key(&self, field: &str, id: impl Into<Value>) -> Result<Option<T>, StoreError> {
        let field = ValidatedFieldName::new(field)?;
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::eq(&field.quoted(), id)]);
        let mut statement = SqlGenerator::build_select("*", &self.quoted_table(), Some(&condition), &[]);
        statement.push(" ", SqlGenerator::build_limit_clause(Some(1), None));
        self.fetch_one("get_by_id", &statement).await
    }

    /// `SELECT COUNT(*)`, 0 when nothing matches
    pub async fn get_count(&self, where_clause: Option<&SqlFragment>) -> Result<i64, StoreError> {
        let statement = SqlGenerator::build_select(
            &SqlGenerator::build_select_clause(&[SelectField::count_all().with_alias("count")]),
            &self.quoted_table(),
            where_clause,
            &[],
        );
        let rows = self.fetch::<Row>("get_count", &statement).await?;
        Ok(scalar(&rows, "count").map(|c| c as i64).unwrap_or(0))
    }

    /// One page of rows plus the full count. Runs two queries: the page, then
    /// the count over the same filter.
    pub async fn get_paginated(
        &self,
        page: PageRequest,
        where_clause: Option<&SqlFragment>,
        order_by: Option<&str>,
    ) -> Result<PaginatedResult<T>, StoreError> {
        let order = order_by
            .filter(|o| !o.trim().is_empty())
            .map(|o| format!("ORDER BY {}", o))
            .unwrap_or_default();
        let pagination = page.to_pagination();

        let mut statement = SqlGenerator::build_select("*", &self.quoted_table(), where_clause, &[&order]);
        statement.push(
            " ",
            SqlGenerator::build_limit_clause(pagination.limit, pagination.offset),
        );

        let data = self.fetch::<T>("get_paginated", &statement).await?;
        let total = self.get_count(where_clause).await?;
        debug!(table = %self.table_name(), page = page.page(), total, "paginated fetch");

        Ok(PaginatedResult::new(data, total, page))
    }

    /// `SELECT fn(column) AS result`; `None` when the aggregate is NULL
    pub async fn aggregate(
        &self,
        function: AggregateFunction,
        column: &str,
        where_clause: Option<&SqlFragment>,
    ) -> Result<Option<f64>, StoreError> {
        let select = SqlGenerator::build_select_clause(&[
            SelectField::aggregate(function, Some(column.to_string())).with_alias("result"),
        ]);
        let statement = SqlGenerator::build_select(&select, &self.quoted_table(), where_clause, &[]);
        let rows = self.fetch::<Row>("aggregate", &statement).await?;
        Ok(scalar(&rows, "result"))
    }

    /// Grouped select with optional HAVING, ordering and limit
    pub async fn group_by<R>(
        &self,
        group_by: &GroupBy,
        select: &[SelectField],
        where_clause: Option<&SqlFragment>,
    ) -> Result<Vec<R>, StoreError>
    where
        R: Serialize + DeserializeOwned + Send,
    {
        let mut statement = SqlGenerator::build_select(
            &SqlGenerator::build_select_clause(select),
            &self.quoted_table(),
            where_clause,
            &[&SqlGenerator::build_group_by_clause(group_by)],
        );
        statement.push(" ", SqlGenerator::build_having_clause(group_by));
        let order = SqlGenerator::build_order_clause(&group_by.order_by);
        if !order.is_empty() {
            statement.push_sql(" ");
            statement.push_sql(&order);
        }
        statement.push(" ", SqlGenerator::build_limit_clause(group_by.limit, None));

        self.fetch("group_by", &statement).await
    }

    /// Substring match of `term` ORed across `fields`
    pub async fn search(&self, fields: &[&str], term: &str, params: &QueryParams) -> Result<Vec<T>, StoreError> {
        if fields.is_empty() {
            return self.get_all(params).await;
        }
        let matches = fields.iter().map(|f| QueryFilter::contains(f, term)).collect();
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::or(matches)]);

        let mut statement = SqlGenerator::build_select(
            "*",
            &self.quoted_table(),
            Some(&condition),
            &[&params.order_clause()],
        );
        statement.push(" ", params.limit_clause());
        self.fetch("search", &statement).await
    }

    /// Rows whose `id` is one of `ids`
    pub async fn get_by_ids(&self, ids: &[Value]) -> Result<Vec<T>, StoreError> {
        self.get_by_keys("id", ids).await
    }

    /// `field IN (...)`; an empty list returns nothing without querying
    pub async fn get_by_keys(&self, field: &str, ids: &[Value]) -> Result<Vec<T>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let field = ValidatedFieldName::new(field)?;
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::in_values(&field.quoted(), ids.to_vec())]);
        let statement = SqlGenerator::build_select("*", &self.quoted_table(), Some(&condition), &[]);
        self.fetch("get_by_ids", &statement).await
    }

    /// `SELECT DISTINCT column ... ORDER BY column`
    pub async fn get_distinct<R>(&self, column: &str, where_clause: Option<&SqlFragment>) -> Result<Vec<R>, StoreError>
    where
        R: Serialize + DeserializeOwned + Send,
    {
        let statement = SqlGenerator::build_select(
            &format!("DISTINCT {}", column),
            &self.quoted_table(),
            where_clause,
            &[&format!("ORDER BY {}", column)],
        );
        self.fetch("get_distinct", &statement).await
    }

    /// Entity-specific read
    pub async fn query<R>(&self, statement: &SqlFragment) -> Result<Vec<R>, StoreError>
    where
        R: Serialize + DeserializeOwned + Send,
    {
        self.fetch("query", statement).await
    }

    pub async fn query_one<R>(&self, statement: &SqlFragment) -> Result<Option<R>, StoreError>
    where
        R: Serialize + DeserializeOwned + Send,
    {
        self.fetch_one("query", statement).await
    }

    /// Run a write, then drop this table's cached reads
    pub async fn execute(&self, statement: &SqlFragment) -> Result<ExecuteResult, StoreError> {
        let result = self
            .executor
            .execute(statement.sql(), statement.params())
            .await?;
        let cleared = self.invalidate_cache();
        debug!(table = %self.table_name(), changes = result.changes, cleared, "write invalidated cache");
        Ok(result)
    }
}
