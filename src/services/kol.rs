//! Influencer (KOL) accounts and their YouTube videos

use super::ServiceOptions;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use store_object::query_builder::{
    AggregateFunction, FilterSet, GroupBy, OrderBy, PageRequest, PaginatedResult, QueryFilter,
    QueryParams, SelectField, SortOrder, SqlGenerator,
};
use store_object::{QueryExecutor, RecordStore, Row, StoreError};

pub const ACCOUNTS_TABLE: &str = "kol_tribit_total";
pub const VIDEOS_TABLE: &str = "kol_ytb_video";
pub const INDIA_TABLE: &str = "kol_tribit_india";

const NO: &str = "\"No.\"";
const PLATFORM: &str = "Platform";
const REGION: &str = "Region";
pub const ACCOUNT: &str = "kol_account";
const URL: &str = "kol_url";
const YOUTUBER: &str = "Youtuber";
const TITLE: &str = "Title";
const VIEWS: &str = "\"video views\"";

const SEARCH_LIMIT: i64 = 50;

/// Account list filters; absent fields do not filter
#[derive(Debug, Clone, Default)]
pub struct KolFilter {
    /// Substring of the account name or URL
    pub keyword: Option<String>,
    pub platform: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    pub youtuber: Option<String>,
    pub min_views: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformCount {
    pub platform: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionCount {
    pub region: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub channel_name: String,
    pub video_count: i64,
    pub total_views: i64,
    pub avg_views: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KolStatistics {
    #[serde(rename = "totalKOLs")]
    pub total_kols: i64,
    pub total_platforms: i64,
    pub total_regions: i64,
    pub total_videos: i64,
    pub total_views: i64,
    /// Only known for the demo dataset
    pub avg_engagement_rate: Option<f64>,
}

impl KolStatistics {
    /// Served when the statistics queries fail
    pub fn fallback() -> Self {
        Self {
            total_kols: 5423,
            total_platforms: 4,
            total_regions: 12,
            total_videos: 125_000,
            total_views: 2_500_000_000,
            avg_engagement_rate: Some(3.5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KolService {
    accounts: RecordStore,
    videos: RecordStore,
    india: RecordStore,
}

impl KolService {
    pub fn new(executor: Arc<dyn QueryExecutor>, options: &ServiceOptions) -> Result<Self, StoreError> {
        Ok(Self {
            accounts: options.store(&executor, ACCOUNTS_TABLE)?,
            videos: options.store(&executor, VIDEOS_TABLE)?,
            india: options.store(&executor, INDIA_TABLE)?,
        })
    }

    /// Accounts ordered by their sequence number
    pub async fn list_accounts(
        &self,
        filter: &KolFilter,
        page: PageRequest,
    ) -> Result<PaginatedResult<Row>, StoreError> {
        let keywords: Vec<String> = filter.keyword.iter().cloned().collect();
        let filters = FilterSet::new()
            .keyword_any(&[ACCOUNT, URL], &keywords)
            .when(filter.platform.clone(), |p| QueryFilter::eq(PLATFORM, p))
            .when(filter.region.clone(), |r| QueryFilter::eq(REGION, r));
        let condition = SqlGenerator::build_where_clause(&filters.into_filters());

        self.accounts
            .get_paginated(page, Some(&condition), Some(&format!("{} ASC", NO)))
            .await
    }

    /// India roster, newest entries first
    pub async fn india_list(
        &self,
        platform: Option<&str>,
        page: PageRequest,
    ) -> Result<PaginatedResult<Row>, StoreError> {
        let filters = FilterSet::new().when(platform, |p| QueryFilter::eq(PLATFORM, p));
        let condition = SqlGenerator::build_where_clause(&filters.into_filters());

        self.india
            .get_paginated(page, Some(&condition), Some(&format!("{} DESC", NO)))
            .await
    }

    /// Accounts whose name or URL contains `term`, at most 50
    pub async fn search_accounts(&self, term: &str) -> Result<Vec<Row>, StoreError> {
        let params = QueryParams::new().order_by(NO, SortOrder::Asc).limit(SEARCH_LIMIT);
        self.accounts.search(&[ACCOUNT, URL], term, &params).await
    }

    pub async fn account_by_number(&self, number: i64) -> Result<Option<Row>, StoreError> {
        self.accounts.get_by_key("No.", number).await
    }

    /// Resolve a path identifier: a sequence number, else an exact account
    /// name, else the first account matching the search
    pub async fn find_account(&self, identifier: &str) -> Result<Option<Row>, StoreError> {
        if let Ok(number) = identifier.trim().parse::<i64>() {
            if let Some(account) = self.account_by_number(number).await? {
                return Ok(Some(account));
            }
        }

        let matches = self.search_accounts(identifier).await?;
        let exact = matches
            .iter()
            .position(|row| row.get(ACCOUNT).and_then(Value::as_str) == Some(identifier));
        Ok(match exact {
            Some(index) => matches.into_iter().nth(index),
            None => matches.into_iter().next(),
        })
    }

    pub async fn platform_stats(&self) -> Result<Vec<PlatformCount>, StoreError> {
        self.distribution(PLATFORM, "platform").await
    }

    pub async fn region_stats(&self) -> Result<Vec<RegionCount>, StoreError> {
        self.distribution(REGION, "region").await
    }

    async fn distribution<R>(&self, column: &str, alias: &str) -> Result<Vec<R>, StoreError>
    where
        R: Serialize + DeserializeOwned + Send,
    {
        let group = GroupBy::single(column).order_by(OrderBy::desc("count"));
        let select = [
            SelectField::field_as(column, alias),
            SelectField::count_all().with_alias("count"),
        ];
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::is_not_null(column)]);
        self.accounts.group_by(&group, &select, Some(&condition)).await
    }

    /// Videos ordered by views, optionally narrowed to a channel and a view floor
    pub async fn list_videos(
        &self,
        filter: &VideoFilter,
        page: PageRequest,
    ) -> Result<PaginatedResult<Row>, StoreError> {
        let filters = FilterSet::new()
            .when(filter.youtuber.as_deref(), |y| QueryFilter::contains(YOUTUBER, y))
            .when(filter.min_views, |v| QueryFilter::gte(VIEWS, v));
        let condition = SqlGenerator::build_where_clause(&filters.into_filters());

        self.videos
            .get_paginated(page, Some(&condition), Some(&format!("{} DESC", VIEWS)))
            .await
    }

    pub async fn top_videos(&self, limit: i64) -> Result<Vec<Row>, StoreError> {
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::is_not_null(VIEWS)]);
        let mut statement = SqlGenerator::build_select(
            "*",
            &self.videos.quoted_table(),
            Some(&condition),
            &[&format!("ORDER BY {} DESC", VIEWS)],
        );
        statement.push(" ", SqlGenerator::build_limit_clause(Some(limit), None));
        self.videos.query(&statement).await
    }

    /// Per-channel totals, largest audience first
    pub async fn channel_stats(&self) -> Result<Vec<ChannelStats>, StoreError> {
        let group = GroupBy::single(YOUTUBER).order_by(OrderBy::desc("totalViews"));
        let select = [
            SelectField::field_as(YOUTUBER, "channelName"),
            SelectField::count_all().with_alias("videoCount"),
            SelectField::sum(VIEWS).with_alias("totalViews"),
            SelectField::avg(VIEWS).with_alias("avgViews"),
        ];
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::is_not_null(YOUTUBER)]);
        self.videos.group_by(&group, &select, Some(&condition)).await
    }

    /// Videos whose title or channel contains `term`, most viewed first
    pub async fn search_videos(&self, term: &str) -> Result<Vec<Row>, StoreError> {
        let params = QueryParams::new().order_by(VIEWS, SortOrder::Desc).limit(SEARCH_LIMIT);
        self.videos.search(&[TITLE, YOUTUBER], term, &params).await
    }

    /// Videos of the channel named like `account`; empty when the account is unknown
    pub async fn videos_for_account(&self, account: &str) -> Result<Vec<Row>, StoreError> {
        if self.accounts.get_by_key(ACCOUNT, account).await?.is_none() {
            return Ok(Vec::new());
        }
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::contains(YOUTUBER, account)]);
        let statement = SqlGenerator::build_select(
            "*",
            &self.videos.quoted_table(),
            Some(&condition),
            &[&format!("ORDER BY {} DESC", VIEWS)],
        );
        self.videos.query(&statement).await
    }

    pub async fn statistics(&self) -> Result<KolStatistics, StoreError> {
        let total_kols = self.accounts.get_count(None).await?;
        let total_platforms = self.platform_stats().await?.len() as i64;
        let total_regions = self.region_stats().await?.len() as i64;
        let total_videos = self.videos.get_count(None).await?;
        let total_views = self
            .videos
            .aggregate(AggregateFunction::Sum, VIEWS, None)
            .await?
            .unwrap_or(0.0) as i64;

        Ok(KolStatistics {
            total_kols,
            total_platforms,
            total_regions,
            total_videos,
            total_views,
            avg_engagement_rate: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{empty_executor, seeded_executor};

    async fn service() -> KolService {
        KolService::new(seeded_executor().await, &ServiceOptions::default()).unwrap()
    }

    fn numbers(rows: &[Row]) -> Vec<i64> {
        rows.iter().map(|r| r["No."].as_i64().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_india_list_newest_first() {
        let kol = service().await;

        let all = kol.india_list(None, PageRequest::default()).await.unwrap();
        assert_eq!(all.total, 5);
        assert_eq!(numbers(&all.data), vec![5, 4, 3, 2, 1]);

        let youtube = kol.india_list(Some("YouTube"), PageRequest::new(1, 2).unwrap()).await.unwrap();
        assert_eq!(youtube.total, 3);
        assert_eq!(youtube.total_pages, 2);
        assert_eq!(numbers(&youtube.data), vec![4, 2]);
    }

    #[tokio::test]
    async fn test_search_videos_orders_by_views() {
        let kol = service().await;

        let found = kol.search_videos("i").await.unwrap();
        let channels: Vec<&str> = found.iter().map(|r| r["Youtuber"].as_str().unwrap()).collect();
        assert_eq!(channels, vec!["T-Series", "PewDiePie", "HowToBasic", "CarryMinati"]);

        let single = kol.search_videos("PERFECT").await.unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0]["Youtuber"], "Dude Perfect");

        assert!(kol.search_videos("no such channel").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_accounts_ordered_and_paged() {
        let kol = service().await;
        let page = kol
            .list_accounts(&KolFilter::default(), PageRequest::new(1, 5).unwrap())
            .await
            .unwrap();

        assert_eq!(numbers(&page.data), vec![1, 2, 3, 4, 5]);
        assert_eq!(page.total, 12);
        assert_eq!(page.total_pages, 3);
    }

    #[tokio::test]
    async fn test_list_accounts_filters_combine() {
        let kol = service().await;
        let filter = KolFilter {
            platform: Some("YouTube".to_string()),
            region: Some("Asia".to_string()),
            ..Default::default()
        };
        let page = kol.list_accounts(&filter, PageRequest::default()).await.unwrap();
        assert_eq!(numbers(&page.data), vec![3, 9]);

        let filter = KolFilter {
            keyword: Some("tiktok.com".to_string()),
            ..Default::default()
        };
        let page = kol.list_accounts(&filter, PageRequest::default()).await.unwrap();
        assert_eq!(numbers(&page.data), vec![5, 6, 12]);
    }

    #[tokio::test]
    async fn test_find_account_prefers_exact_match() {
        let kol = service().await;

        let by_number = kol.find_account("4").await.unwrap().unwrap();
        assert_eq!(by_number["kol_account"], "Dude Perfect");

        let exact = kol.find_account("MrBeast").await.unwrap().unwrap();
        assert_eq!(exact["No."], 1);

        assert!(kol.find_account("nobody_here").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_platform_distribution() {
        let kol = service().await;
        let platforms = kol.platform_stats().await.unwrap();

        assert_eq!(
            platforms[0],
            PlatformCount {
                platform: "YouTube".to_string(),
                count: 6
            }
        );
        assert_eq!(platforms.iter().map(|p| p.count).sum::<i64>(), 12);
    }

    #[tokio::test]
    async fn test_videos_ordered_by_views() {
        let kol = service().await;
        let page = kol
            .list_videos(&VideoFilter::default(), PageRequest::new(1, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(page.data[0]["Youtuber"], "T-Series");
        assert_eq!(page.data[1]["Youtuber"], "PewDiePie");
        assert_eq!(page.total, 6);

        let filter = VideoFilter {
            min_views: Some(10_000_000_000),
            ..Default::default()
        };
        let page = kol.list_videos(&filter, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 4);
    }

    #[tokio::test]
    async fn test_videos_for_account() {
        let kol = service().await;
        let videos = kol.videos_for_account("MrBeast").await.unwrap();
        assert_eq!(videos.len(), 1);
        assert!(kol.videos_for_account("unknown").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_statistics() {
        let kol = service().await;
        let stats = kol.statistics().await.unwrap();

        assert_eq!(stats.total_kols, 12);
        assert_eq!(stats.total_platforms, 4);
        assert_eq!(stats.total_regions, 5);
        assert_eq!(stats.total_videos, 6);
        assert_eq!(stats.total_views, 309_067_974_914);
        assert_eq!(stats.avg_engagement_rate, None);
    }

    #[tokio::test]
    async fn test_statistics_error_propagates() {
        let kol = KolService::new(empty_executor().await, &ServiceOptions::default()).unwrap();
        assert!(kol.statistics().await.is_err());
    }

    #[test]
    fn test_fallback_keys_match_live_shape() {
        let live = serde_json::to_value(KolStatistics {
            total_kols: 1,
            total_platforms: 1,
            total_regions: 1,
            total_videos: 1,
            total_views: 1,
            avg_engagement_rate: None,
        })
        .unwrap();
        let fallback = serde_json::to_value(KolStatistics::fallback()).unwrap();

        let keys = |v: &Value| v.as_object().unwrap().keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys(&live), keys(&fallback));
        assert_eq!(fallback["totalKOLs"], 5423);
    }
}
