//! Owned ("self-KOC") channels: Instagram posts, YouTube and TikTok videos and
//! the accounts that publish them

use super::{integer, number, ServiceOptions};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use store_object::query_builder::{
    AggregateFunction, FilterSet, OrderBy, PageRequest, PaginatedResult, QueryFilter, QueryParams,
    SortOrder, SqlFragment, SqlGenerator,
};
use store_object::{QueryExecutor, RecordStore, Row, StoreError};

pub const ACCOUNTS_TABLE: &str = "selkoc_account";

const ACCOUNT_NAME: &str = "account_name";
const ACCOUNT_PLATFORM: &str = "platform";
const FOLLOWERS: &str = "followers";

const CROSS_SEARCH_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelfMediaPlatform {
    Instagram,
    YouTube,
    TikTok,
}

impl SelfMediaPlatform {
    pub const ALL: [SelfMediaPlatform; 3] = [
        SelfMediaPlatform::Instagram,
        SelfMediaPlatform::YouTube,
        SelfMediaPlatform::TikTok,
    ];

    /// Full name or table suffix (`ins`, `ytb`, `tk`), any case
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "instagram" | "ins" => Some(SelfMediaPlatform::Instagram),
            "youtube" | "ytb" => Some(SelfMediaPlatform::YouTube),
            "tiktok" | "tk" => Some(SelfMediaPlatform::TikTok),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SelfMediaPlatform::Instagram => "Instagram",
            SelfMediaPlatform::YouTube => "YouTube",
            SelfMediaPlatform::TikTok => "TikTok",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            SelfMediaPlatform::Instagram => "selfkoc_ins",
            SelfMediaPlatform::YouTube => "selfkoc_ytb",
            SelfMediaPlatform::TikTok => "selkoc_tk",
        }
    }

    fn account_column(&self) -> &'static str {
        match self {
            SelfMediaPlatform::Instagram => "selfkoc_account",
            SelfMediaPlatform::YouTube => "channel_name",
            SelfMediaPlatform::TikTok => ACCOUNT_NAME,
        }
    }

    fn search_columns(&self) -> &'static [&'static str] {
        match self {
            SelfMediaPlatform::Instagram => &["selfkoc_account"],
            SelfMediaPlatform::YouTube => &["channel_name", "video_title"],
            SelfMediaPlatform::TikTok => &[ACCOUNT_NAME],
        }
    }

    /// Instagram stores its view count as text
    fn views_column(&self) -> &'static str {
        match self {
            SelfMediaPlatform::Instagram => "CAST(Views AS INTEGER)",
            SelfMediaPlatform::YouTube | SelfMediaPlatform::TikTok => "views",
        }
    }

    fn likes_column(&self) -> &'static str {
        match self {
            SelfMediaPlatform::Instagram => "Likes",
            SelfMediaPlatform::YouTube | SelfMediaPlatform::TikTok => "likes",
        }
    }

    fn date_column(&self) -> &'static str {
        match self {
            SelfMediaPlatform::Instagram => "selfkoc_post_date",
            SelfMediaPlatform::YouTube => "published_date",
            SelfMediaPlatform::TikTok => "posted_date",
        }
    }

    /// Lists and top-N rank by likes on Instagram and by views elsewhere
    fn rank_column(&self) -> &'static str {
        match self {
            SelfMediaPlatform::Instagram => "Likes",
            SelfMediaPlatform::YouTube | SelfMediaPlatform::TikTok => "views",
        }
    }

    fn engagement(&self) -> &'static str {
        match self {
            SelfMediaPlatform::Instagram => "Likes + Comments",
            SelfMediaPlatform::YouTube | SelfMediaPlatform::TikTok => "views",
        }
    }
}

/// Content filters; each maps onto the platform's own column names
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    /// Substring of the account or channel name
    pub account: Option<String>,
    pub min_views: Option<i64>,
    pub min_likes: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl ContentFilter {
    fn filters(&self, platform: SelfMediaPlatform) -> Vec<QueryFilter> {
        FilterSet::new()
            .when(self.account.as_deref(), |a| QueryFilter::contains(platform.account_column(), a))
            .when(self.min_views, |v| QueryFilter::gte(platform.views_column(), v))
            .when(self.min_likes, |l| QueryFilter::gte(platform.likes_column(), l))
            .when(self.date_from, |d| QueryFilter::gte(platform.date_column(), d.to_string()))
            .when(self.date_to, |d| QueryFilter::lte(platform.date_column(), d.to_string()))
            .into_filters()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub platform: Option<String>,
    pub min_followers: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossPlatformResults {
    pub instagram: Vec<Row>,
    pub youtube: Vec<Row>,
    pub tiktok: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountContent {
    pub instagram: Vec<Row>,
    pub youtube: Vec<Row>,
    pub tiktok: Vec<Row>,
    pub account_info: Option<Row>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfMediaStats {
    pub total_instagram_posts: i64,
    #[serde(rename = "totalYouTubeVideos")]
    pub total_youtube_videos: i64,
    #[serde(rename = "totalTikTokVideos")]
    pub total_tiktok_videos: i64,
    pub total_accounts: i64,
    pub avg_instagram_likes: f64,
    #[serde(rename = "avgYouTubeViews")]
    pub avg_youtube_views: f64,
    #[serde(rename = "avgTikTokViews")]
    pub avg_tiktok_views: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformComparison {
    pub platform: String,
    pub content_count: i64,
    /// Likes plus comments on Instagram, views elsewhere
    pub avg_engagement: f64,
    pub top_account: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SelfMediaService {
    instagram: RecordStore,
    youtube: RecordStore,
    tiktok: RecordStore,
    accounts: RecordStore,
}

impl SelfMediaService {
    pub fn new(executor: Arc<dyn QueryExecutor>, options: &ServiceOptions) -> Result<Self, StoreError> {
        Ok(Self {
            instagram: options.store(&executor, SelfMediaPlatform::Instagram.table())?,
            youtube: options.store(&executor, SelfMediaPlatform::YouTube.table())?,
            tiktok: options.store(&executor, SelfMediaPlatform::TikTok.table())?,
            accounts: options.store(&executor, ACCOUNTS_TABLE)?,
        })
    }

    fn content(&self, platform: SelfMediaPlatform) -> &RecordStore {
        match platform {
            SelfMediaPlatform::Instagram => &self.instagram,
            SelfMediaPlatform::YouTube => &self.youtube,
            SelfMediaPlatform::TikTok => &self.tiktok,
        }
    }

    pub async fn list(
        &self,
        platform: SelfMediaPlatform,
        filter: &ContentFilter,
        page: PageRequest,
    ) -> Result<PaginatedResult<Row>, StoreError> {
        let condition = SqlGenerator::build_where_clause(&filter.filters(platform));
        self.content(platform)
            .get_paginated(page, Some(&condition), Some(&OrderBy::desc(platform.rank_column()).to_sql()))
            .await
    }

    pub async fn top(&self, platform: SelfMediaPlatform, limit: i64) -> Result<Vec<Row>, StoreError> {
        ranked(self.content(platform), platform.rank_column(), limit).await
    }

    pub async fn accounts(
        &self,
        filter: &AccountFilter,
        page: PageRequest,
    ) -> Result<PaginatedResult<Row>, StoreError> {
        let filters = FilterSet::new()
            .when(filter.platform.clone(), |p| QueryFilter::eq(ACCOUNT_PLATFORM, p))
            .when(filter.min_followers, |f| QueryFilter::gte(FOLLOWERS, f));
        let condition = SqlGenerator::build_where_clause(&filters.into_filters());
        self.accounts
            .get_paginated(page, Some(&condition), Some(&OrderBy::desc(FOLLOWERS).to_sql()))
            .await
    }

    pub async fn top_accounts(&self, limit: i64) -> Result<Vec<Row>, StoreError> {
        ranked(&self.accounts, FOLLOWERS, limit).await
    }

    /// Up to ten matches per platform, best ranked first
    pub async fn search_across_platforms(&self, term: &str) -> Result<CrossPlatformResults, StoreError> {
        let search = |platform: SelfMediaPlatform| {
            let params = QueryParams::new()
                .order_by(platform.rank_column(), SortOrder::Desc)
                .limit(CROSS_SEARCH_LIMIT);
            async move {
                self.content(platform)
                    .search(platform.search_columns(), term, &params)
                    .await
            }
        };
        let (instagram, youtube, tiktok) = tokio::try_join!(
            search(SelfMediaPlatform::Instagram),
            search(SelfMediaPlatform::YouTube),
            search(SelfMediaPlatform::TikTok),
        )?;
        Ok(CrossPlatformResults {
            instagram,
            youtube,
            tiktok,
        })
    }

    /// Everything published under names like `account`, newest first, plus its account row
    pub async fn account_content(&self, account: &str) -> Result<AccountContent, StoreError> {
        let by_account = |platform: SelfMediaPlatform| {
            let condition =
                SqlGenerator::build_where_clause(&[QueryFilter::contains(platform.account_column(), account)]);
            let store = self.content(platform);
            let statement = SqlGenerator::build_select(
                "*",
                &store.quoted_table(),
                Some(&condition),
                &[&SqlGenerator::build_order_clause(&[OrderBy::desc(platform.date_column())])],
            );
            async move { store.query::<Row>(&statement).await }
        };
        let account_info = async {
            let condition = SqlGenerator::build_where_clause(&[QueryFilter::contains(ACCOUNT_NAME, account)]);
            let mut statement =
                SqlGenerator::build_select("*", &self.accounts.quoted_table(), Some(&condition), &[]);
            statement.push(" ", SqlGenerator::build_limit_clause(Some(1), None));
            self.accounts.query_one::<Row>(&statement).await
        };

        let (instagram, youtube, tiktok, account_info) = tokio::try_join!(
            by_account(SelfMediaPlatform::Instagram),
            by_account(SelfMediaPlatform::YouTube),
            by_account(SelfMediaPlatform::TikTok),
            account_info,
        )?;
        Ok(AccountContent {
            instagram,
            youtube,
            tiktok,
            account_info,
        })
    }

    pub async fn overall_stats(&self) -> Result<SelfMediaStats, StoreError> {
        let (
            total_instagram_posts,
            total_youtube_videos,
            total_tiktok_videos,
            total_accounts,
            avg_instagram_likes,
            avg_youtube_views,
            avg_tiktok_views,
        ) = tokio::try_join!(
            self.instagram.get_count(None),
            self.youtube.get_count(None),
            self.tiktok.get_count(None),
            self.accounts.get_count(None),
            self.instagram.aggregate(AggregateFunction::Avg, "Likes", None),
            self.youtube.aggregate(AggregateFunction::Avg, "views", None),
            self.tiktok.aggregate(AggregateFunction::Avg, "views", None),
        )?;

        Ok(SelfMediaStats {
            total_instagram_posts,
            total_youtube_videos,
            total_tiktok_videos,
            total_accounts,
            avg_instagram_likes: avg_instagram_likes.unwrap_or(0.0),
            avg_youtube_views: avg_youtube_views.unwrap_or(0.0),
            avg_tiktok_views: avg_tiktok_views.unwrap_or(0.0),
        })
    }

    /// One row per platform: content volume, average engagement and the best ranked account
    pub async fn platform_comparison(&self) -> Result<Vec<PlatformComparison>, StoreError> {
        let mut comparison = Vec::with_capacity(SelfMediaPlatform::ALL.len());
        for platform in SelfMediaPlatform::ALL {
            let store = self.content(platform);
            let statement = SqlFragment::raw(format!(
                "SELECT COUNT(*) AS contentCount, AVG({engagement}) AS avgEngagement, \
                 (SELECT {account} FROM {table} ORDER BY {rank} DESC LIMIT 1) AS topAccount FROM {table}",
                engagement = platform.engagement(),
                account = platform.account_column(),
                rank = platform.rank_column(),
                table = store.quoted_table(),
            ))?;
            let row = store.query_one::<Row>(&statement).await?.unwrap_or_default();
            comparison.push(PlatformComparison {
                platform: platform.label().to_string(),
                content_count: integer(&row, "contentCount"),
                avg_engagement: number(&row, "avgEngagement"),
                top_account: row.get("topAccount").and_then(|v| v.as_str()).map(str::to_string),
            });
        }
        Ok(comparison)
    }
}

/// Rows with a value in `column`, highest first
async fn ranked(store: &RecordStore, column: &str, limit: i64) -> Result<Vec<Row>, StoreError> {
    let condition = SqlGenerator::build_where_clause(&[QueryFilter::is_not_null(column)]);
    let mut statement = SqlGenerator::build_select(
        "*",
        &store.quoted_table(),
        Some(&condition),
        &[&SqlGenerator::build_order_clause(&[OrderBy::desc(column)])],
    );
    statement.push(" ", SqlGenerator::build_limit_clause(Some(limit), None));
    store.query(&statement).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{empty_executor, seeded_executor};

    async fn service() -> SelfMediaService {
        SelfMediaService::new(seeded_executor().await, &ServiceOptions::default()).unwrap()
    }

    fn ids(rows: &[Row], column: &str) -> Vec<String> {
        rows.iter().map(|r| r[column].as_str().unwrap().to_string()).collect()
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!(SelfMediaPlatform::parse("INS"), Some(SelfMediaPlatform::Instagram));
        assert_eq!(SelfMediaPlatform::parse("youtube"), Some(SelfMediaPlatform::YouTube));
        assert_eq!(SelfMediaPlatform::parse("tk"), Some(SelfMediaPlatform::TikTok));
        assert_eq!(SelfMediaPlatform::parse("myspace"), None);
    }

    #[tokio::test]
    async fn test_instagram_list_filters_and_ranks_by_likes() {
        let media = service().await;

        let europe = ContentFilter {
            account: Some("europe".to_string()),
            ..Default::default()
        };
        let page = media
            .list(SelfMediaPlatform::Instagram, &europe, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(ids(&page.data, "selfkoc_video_id"), vec!["ig04", "ig03"]);

        let since_may = ContentFilter {
            date_from: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..Default::default()
        };
        let page = media
            .list(SelfMediaPlatform::Instagram, &since_may, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 3);

        let viewed = ContentFilter {
            min_views: Some(10_000),
            ..Default::default()
        };
        let page = media
            .list(SelfMediaPlatform::Instagram, &viewed, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(ids(&page.data, "selfkoc_video_id"), vec!["ig02", "ig01"]);
    }

    #[tokio::test]
    async fn test_tiktok_list_by_likes() {
        let media = service().await;
        let filter = ContentFilter {
            min_likes: Some(5_000),
            ..Default::default()
        };
        let page = media
            .list(SelfMediaPlatform::TikTok, &filter, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(ids(&page.data, "video_id"), vec!["tk01", "tk03", "tk02"]);
    }

    #[tokio::test]
    async fn test_top_lists_skip_nulls() {
        let media = service().await;

        let instagram = media.top(SelfMediaPlatform::Instagram, 10).await.unwrap();
        assert_eq!(ids(&instagram, "selfkoc_video_id"), vec!["ig02", "ig01", "ig04", "ig03"]);

        let youtube = media.top(SelfMediaPlatform::YouTube, 1).await.unwrap();
        assert_eq!(ids(&youtube, "video_id"), vec!["yt01"]);

        let accounts = media.top_accounts(2).await.unwrap();
        assert_eq!(ids(&accounts, "account_id"), vec!["acc01", "acc03"]);
    }

    #[tokio::test]
    async fn test_account_list_filters() {
        let media = service().await;
        let filter = AccountFilter {
            platform: Some("Instagram".to_string()),
            ..Default::default()
        };
        let page = media.accounts(&filter, PageRequest::default()).await.unwrap();
        assert_eq!(ids(&page.data, "account_id"), vec!["acc02", "acc04"]);

        let large = AccountFilter {
            min_followers: Some(50_000),
            ..Default::default()
        };
        assert_eq!(media.accounts(&large, PageRequest::default()).await.unwrap().total, 3);
    }

    #[tokio::test]
    async fn test_search_across_platforms() {
        let media = service().await;
        let found = media.search_across_platforms("outdoor").await.unwrap();

        assert_eq!(ids(&found.instagram, "selfkoc_video_id"), vec!["ig05"]);
        assert_eq!(ids(&found.youtube, "video_id"), vec!["yt03"]);
        assert_eq!(ids(&found.tiktok, "video_id"), vec!["tk03", "tk04"]);
    }

    #[tokio::test]
    async fn test_account_content_newest_first() {
        let media = service().await;

        let content = media.account_content("tribit_official").await.unwrap();
        assert_eq!(ids(&content.instagram, "selfkoc_video_id"), vec!["ig02", "ig01"]);
        assert_eq!(ids(&content.tiktok, "video_id"), vec!["tk02", "tk01"]);
        assert!(content.account_info.is_some());

        let nobody = media.account_content("nobody").await.unwrap();
        assert!(nobody.instagram.is_empty() && nobody.youtube.is_empty() && nobody.tiktok.is_empty());
        assert_eq!(nobody.account_info, None);
    }

    #[tokio::test]
    async fn test_overall_stats() {
        let media = service().await;
        let stats = media.overall_stats().await.unwrap();

        assert_eq!(
            (
                stats.total_instagram_posts,
                stats.total_youtube_videos,
                stats.total_tiktok_videos,
                stats.total_accounts
            ),
            (5, 3, 4, 5)
        );
        assert_eq!(stats.avg_instagram_likes, 1635.0);
        assert_eq!(stats.avg_youtube_views, 91_000.0);
        assert_eq!(stats.avg_tiktok_views, 188_000.0);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalYouTubeVideos"], 3);
        assert_eq!(json["avgTikTokViews"], 188_000.0);
    }

    #[tokio::test]
    async fn test_platform_comparison() {
        let media = service().await;
        let comparison = media.platform_comparison().await.unwrap();

        let platforms: Vec<&str> = comparison.iter().map(|c| c.platform.as_str()).collect();
        assert_eq!(platforms, vec!["Instagram", "YouTube", "TikTok"]);
        assert_eq!(comparison[0].content_count, 5);
        assert_eq!(comparison[0].avg_engagement, 1731.25);
        assert_eq!(comparison[0].top_account.as_deref(), Some("tribit_official"));
        assert_eq!(comparison[1].top_account.as_deref(), Some("Tribit Official"));
        assert_eq!(comparison[2].avg_engagement, 188_000.0);
    }

    #[tokio::test]
    async fn test_missing_tables_surface_errors() {
        let media = SelfMediaService::new(empty_executor().await, &ServiceOptions::default()).unwrap();
        assert!(media.overall_stats().await.is_err());
        assert!(media.search_across_platforms("x").await.is_err());
    }
}
