//! Search-insight keywords: volumes, CPC and query modifiers per region and language

use super::ServiceOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use store_object::query_builder::{
    FilterSet, GroupBy, OrderBy, PageRequest, PaginatedResult, QueryFilter, SelectField,
    SqlGenerator,
};
use store_object::{QueryExecutor, RecordStore, Row, StoreError};

pub const TABLE: &str = "insight_search";

const KEYWORD: &str = "keyword";
const REGION: &str = "region";
const LANGUAGE: &str = "language";
const SUGGESTION: &str = "suggestion";
const VOLUME: &str = "search_volume";
const CPC: &str = "cost_per_click";
const MODIFIER: &str = "modifier";
const MODIFIER_TYPE: &str = "modifier_type";

const DEFAULT_ORDER: &str = "search_volume DESC";

/// Advanced search filters. Keywords are ORed, every other filter is ANDed.
#[derive(Debug, Clone, Default)]
pub struct InsightFilter {
    pub keywords: Vec<String>,
    pub regions: Vec<String>,
    pub languages: Vec<String>,
    pub min_volume: Option<i64>,
    pub max_volume: Option<i64>,
    pub min_cpc: Option<f64>,
    pub max_cpc: Option<f64>,
}

impl InsightFilter {
    /// No keyword, region or language narrowing
    pub fn is_unscoped(&self) -> bool {
        self.keywords.is_empty() && self.regions.is_empty() && self.languages.is_empty()
    }

    fn filters(&self) -> Vec<QueryFilter> {
        FilterSet::new()
            .keyword_any(&[KEYWORD], &self.keywords)
            .any_of(REGION, &self.regions)
            .any_of(LANGUAGE, &self.languages)
            .maybe(QueryFilter::range(
                VOLUME,
                self.min_volume.map(Value::from),
                self.max_volume.map(Value::from),
            ))
            .maybe(QueryFilter::range(
                CPC,
                self.min_cpc.map(Value::from),
                self.max_cpc.map(Value::from),
            ))
            .into_filters()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionVolume {
    pub region: String,
    pub total_volume: i64,
    pub avg_cpc: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageKeywords {
    pub language: String,
    pub keyword_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierCount {
    pub modifier_type: String,
    pub modifier: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightSummary {
    pub total_keywords: i64,
    pub total_volume: i64,
    pub avg_cpc: f64,
    pub regions: i64,
    pub languages: i64,
}

#[derive(Debug, Clone)]
pub struct InsightSearchService {
    searches: RecordStore,
}

impl InsightSearchService {
    pub fn new(executor: Arc<dyn QueryExecutor>, options: &ServiceOptions) -> Result<Self, StoreError> {
        Ok(Self {
            searches: options.store(&executor, TABLE)?,
        })
    }

    /// Rows whose keyword contains `keyword`, highest volume first
    pub async fn search_by_keyword(
        &self,
        keyword: &str,
        region: Option<&str>,
        language: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<Row>, StoreError> {
        let filters = FilterSet::new()
            .push(QueryFilter::contains(KEYWORD, keyword))
            .when(region, |r| QueryFilter::eq(REGION, r))
            .when(language, |l| QueryFilter::eq(LANGUAGE, l));
        self.ranked(filters, DEFAULT_ORDER, limit).await
    }

    pub async fn top_searches(
        &self,
        limit: i64,
        region: Option<&str>,
        language: Option<&str>,
    ) -> Result<Vec<Row>, StoreError> {
        let filters = FilterSet::new()
            .push(QueryFilter::is_not_null(VOLUME))
            .when(region, |r| QueryFilter::eq(REGION, r))
            .when(language, |l| QueryFilter::eq(LANGUAGE, l));
        self.ranked(filters, DEFAULT_ORDER, Some(limit)).await
    }

    /// Rows with a CPC inside `[min, max]`, cheapest first
    pub async fn by_cpc_range(&self, min: f64, max: f64) -> Result<Vec<Row>, StoreError> {
        let filters = FilterSet::new().push(QueryFilter::between(CPC, min, max));
        self.ranked(filters, "cost_per_click ASC", None).await
    }

    async fn ranked(&self, filters: FilterSet, order: &str, limit: Option<i64>) -> Result<Vec<Row>, StoreError> {
        let condition = SqlGenerator::build_where_clause(&filters.into_filters());
        let mut statement = SqlGenerator::build_select(
            "*",
            &self.searches.quoted_table(),
            Some(&condition),
            &[&format!("ORDER BY {}", order)],
        );
        statement.push(" ", SqlGenerator::build_limit_clause(limit, None));
        self.searches.query(&statement).await
    }

    pub async fn volume_by_region(&self) -> Result<Vec<RegionVolume>, StoreError> {
        let group = GroupBy::single(REGION).order_by(OrderBy::desc("total_volume"));
        let select = [
            SelectField::field(REGION),
            SelectField::sum(VOLUME).with_alias("total_volume"),
            SelectField::avg(CPC).with_alias("avg_cpc"),
        ];
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::is_not_null(REGION)]);
        self.searches.group_by(&group, &select, Some(&condition)).await
    }

    pub async fn keyword_count_by_language(&self) -> Result<Vec<LanguageKeywords>, StoreError> {
        let group = GroupBy::single(LANGUAGE).order_by(OrderBy::desc("keyword_count"));
        let select = [
            SelectField::field(LANGUAGE),
            SelectField::count_distinct(KEYWORD).with_alias("keyword_count"),
        ];
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::is_not_null(LANGUAGE)]);
        self.searches.group_by(&group, &select, Some(&condition)).await
    }

    /// Distinct suggestions for keywords containing `keyword`
    pub async fn suggestions(&self, keyword: &str, limit: i64) -> Result<Vec<String>, StoreError> {
        let condition = SqlGenerator::build_where_clause(&[
            QueryFilter::contains(KEYWORD, keyword),
            QueryFilter::is_not_null(SUGGESTION),
        ]);
        let mut statement = SqlGenerator::build_select(
            &format!("DISTINCT {}", SUGGESTION),
            &self.searches.quoted_table(),
            Some(&condition),
            &[],
        );
        statement.push(" ", SqlGenerator::build_limit_clause(Some(limit), None));

        let rows: Vec<Row> = self.searches.query(&statement).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.get(SUGGESTION).and_then(Value::as_str).map(str::to_string))
            .collect())
    }

    pub async fn modifier_stats(&self) -> Result<Vec<ModifierCount>, StoreError> {
        let group = GroupBy::new(vec![MODIFIER_TYPE.to_string(), MODIFIER.to_string()])
            .order_by(OrderBy::desc("count"));
        let select = [
            SelectField::field(MODIFIER_TYPE),
            SelectField::field(MODIFIER),
            SelectField::count_all().with_alias("count"),
        ];
        let condition = SqlGenerator::build_where_clause(&[
            QueryFilter::is_not_null(MODIFIER),
            QueryFilter::is_not_null(MODIFIER_TYPE),
        ]);
        self.searches.group_by(&group, &select, Some(&condition)).await
    }

    pub async fn advanced_search(
        &self,
        filter: &InsightFilter,
        page: PageRequest,
    ) -> Result<PaginatedResult<Row>, StoreError> {
        let condition = SqlGenerator::build_where_clause(&filter.filters());
        self.searches
            .get_paginated(page, Some(&condition), Some(DEFAULT_ORDER))
            .await
    }

    pub async fn summary(&self) -> Result<InsightSummary, StoreError> {
        let select = SqlGenerator::build_select_clause(&[
            SelectField::count_distinct(KEYWORD).with_alias("totalKeywords"),
            SelectField::expression("COALESCE(SUM(search_volume), 0)", "totalVolume"),
            SelectField::expression("COALESCE(AVG(cost_per_click), 0.0)", "avgCpc"),
            SelectField::count_distinct(REGION).with_alias("regions"),
            SelectField::count_distinct(LANGUAGE).with_alias("languages"),
        ]);
        let statement = SqlGenerator::build_select(&select, &self.searches.quoted_table(), None, &[]);
        self.searches
            .query_one(&statement)
            .await?
            .ok_or_else(|| StoreError::NotFound("insight summary".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::services::test_support::seeded_executor;

    async fn service() -> InsightSearchService {
        InsightSearchService::new(seeded_executor().await, &ServiceOptions::default()).unwrap()
    }

    fn keywords(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r["keyword"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_search_by_keyword_orders_by_volume() {
        let insight = service().await;
        let rows = insight.search_by_keyword("speaker", None, None, None).await.unwrap();

        let volumes: Vec<i64> = rows.iter().map(|r| r["search_volume"].as_i64().unwrap()).collect();
        assert_eq!(volumes, vec![74000, 22000, 18000, 12000, 9900]);

        let uk = insight.search_by_keyword("speaker", Some("UK"), Some("en"), None).await.unwrap();
        assert_eq!(uk.len(), 1);
    }

    #[tokio::test]
    async fn test_advanced_search_combines_filters() {
        let insight = service().await;
        let filter = InsightFilter {
            keywords: vec!["speaker".to_string(), "lautsprecher".to_string()],
            regions: vec!["US".to_string(), "DE".to_string()],
            min_volume: Some(10_000),
            max_cpc: Some(1.0),
            ..Default::default()
        };
        let page = insight.advanced_search(&filter, PageRequest::default()).await.unwrap();

        assert_eq!(keywords(&page.data), vec!["lautsprecher bluetooth", "waterproof speaker"]);
        assert_eq!(page.total, 2);
        assert!(!filter.is_unscoped());
        assert!(InsightFilter::default().is_unscoped());
    }

    #[tokio::test]
    async fn test_cpc_range_is_inclusive() {
        let insight = service().await;
        let rows = insight.by_cpc_range(0.5, 0.7).await.unwrap();
        let cpcs: Vec<f64> = rows.iter().map(|r| r["cost_per_click"].as_f64().unwrap()).collect();
        assert_eq!(cpcs, vec![0.5, 0.65, 0.7]);
    }

    #[tokio::test]
    async fn test_grouped_statistics() {
        let insight = service().await;

        let regions = insight.volume_by_region().await.unwrap();
        assert_eq!(regions[0].region, "US");
        assert_eq!(regions[0].total_volume, 101_900);

        let languages = insight.keyword_count_by_language().await.unwrap();
        assert_eq!(
            languages[0],
            LanguageKeywords {
                language: "en".to_string(),
                keyword_count: 4
            }
        );

        let modifiers = insight.modifier_stats().await.unwrap();
        assert_eq!(modifiers.iter().map(|m| m.count).sum::<i64>(), 8);
    }

    #[tokio::test]
    async fn test_suggestions_and_summary() {
        let insight = service().await;
        let suggestions = insight.suggestions("tribit", 5).await.unwrap();
        assert_eq!(suggestions.len(), 2);

        let summary = insight.summary().await.unwrap();
        assert_eq!(summary.total_keywords, 7);
        assert_eq!(summary.total_volume, 200_300);
        assert_eq!(summary.regions, 5);
        assert_eq!(summary.languages, 3);
    }
}
