//! 2024 KOL campaign posts

use super::{round_to, ServiceOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use store_object::query_builder::{
    FilterSet, GroupBy, OrderBy, PageRequest, PaginatedResult, QueryFilter, SelectField,
    SortOrder, SqlGenerator,
};
use store_object::{QueryExecutor, RecordStore, Row, StoreError};

pub const TABLE: &str = "kol_tribit_2024";

const NO: &str = "\"No.\"";
const PLATFORM: &str = "platform";
const ACCOUNT: &str = "kol_account";
const POST_URL: &str = "kol_post_url";

const SUGGESTION_LIMIT: i64 = 10;

/// Sortable columns, keyed by the sanitized name clients send (`No.` arrives as `No`)
const SORTABLE: &[(&str, &str)] = &[("No", NO), ("platform", PLATFORM), ("kol_account", ACCOUNT)];

#[derive(Debug, Clone, Default)]
pub struct Kol2024Filter {
    /// Substring of the account name or post URL
    pub keyword: Option<String>,
    pub platform: Option<String>,
    /// One of `No.`, `platform`, `kol_account`; anything else sorts by `No.`
    pub order_by: Option<String>,
    pub order: Option<SortOrder>,
}

impl Kol2024Filter {
    fn order_clause(&self) -> String {
        let column = self
            .order_by
            .as_deref()
            .and_then(|requested| OrderBy::sanitized(requested, None))
            .and_then(|requested| SORTABLE.iter().find(|(name, _)| *name == requested.column))
            .map(|(_, column)| *column)
            .unwrap_or(NO);
        OrderBy::new(column, self.order.unwrap_or_default()).to_sql()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformShare {
    pub platform: String,
    pub count: i64,
    /// Share of all posts, two decimals
    #[serde(default)]
    pub percentage: f64,
}

#[derive(Debug, Clone)]
pub struct Kol2024Service {
    posts: RecordStore,
}

impl Kol2024Service {
    pub fn new(executor: Arc<dyn QueryExecutor>, options: &ServiceOptions) -> Result<Self, StoreError> {
        Ok(Self {
            posts: options.store(&executor, TABLE)?,
        })
    }

    pub async fn list(
        &self,
        filter: &Kol2024Filter,
        page: PageRequest,
    ) -> Result<PaginatedResult<Row>, StoreError> {
        let keywords: Vec<String> = filter.keyword.iter().cloned().collect();
        let filters = FilterSet::new()
            .keyword_any(&[ACCOUNT, POST_URL], &keywords)
            .when(filter.platform.clone(), |p| QueryFilter::eq(PLATFORM, p));
        let condition = SqlGenerator::build_where_clause(&filters.into_filters());

        self.posts
            .get_paginated(page, Some(&condition), Some(&filter.order_clause()))
            .await
    }

    /// Post count per platform with its percentage of the total
    pub async fn platform_stats(&self) -> Result<Vec<PlatformShare>, StoreError> {
        let group = GroupBy::single(PLATFORM).order_by(OrderBy::desc("count"));
        let select = [
            SelectField::field(PLATFORM),
            SelectField::count_all().with_alias("count"),
        ];
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::is_not_null(PLATFORM)]);
        let mut shares: Vec<PlatformShare> = self.posts.group_by(&group, &select, Some(&condition)).await?;

        let total: i64 = shares.iter().map(|s| s.count).sum();
        if total > 0 {
            for share in &mut shares {
                share.percentage = round_to(share.count as f64 / total as f64 * 100.0, 2);
            }
        }
        Ok(shares)
    }

    pub async fn platforms(&self) -> Result<Vec<String>, StoreError> {
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::is_not_null(PLATFORM)]);
        let rows: Vec<Row> = self.posts.get_distinct(PLATFORM, Some(&condition)).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.get(PLATFORM).and_then(Value::as_str).map(str::to_string))
            .collect())
    }

    pub async fn by_ids(&self, ids: &[i64]) -> Result<Vec<Row>, StoreError> {
        let ids: Vec<Value> = ids.iter().map(|id| Value::from(*id)).collect();
        self.posts.get_by_keys("No.", &ids).await
    }

    pub async fn total_count(&self, platform: Option<&str>) -> Result<i64, StoreError> {
        let filters = FilterSet::new().when(platform, |p| QueryFilter::eq(PLATFORM, p));
        let condition = SqlGenerator::build_where_clause(&filters.into_filters());
        self.posts.get_count(Some(&condition)).await
    }

    /// Account names starting with `prefix`, at most ten
    pub async fn account_suggestions(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::like(ACCOUNT, &format!("{}%", prefix))]);
        let mut statement = SqlGenerator::build_select(
            &format!("DISTINCT {}", ACCOUNT),
            &self.posts.quoted_table(),
            Some(&condition),
            &[&format!("ORDER BY {}", ACCOUNT)],
        );
        statement.push(" ", SqlGenerator::build_limit_clause(Some(SUGGESTION_LIMIT), None));

        let rows: Vec<Row> = self.posts.query(&statement).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.get(ACCOUNT).and_then(Value::as_str).map(str::to_string))
            .collect())
    }
}
