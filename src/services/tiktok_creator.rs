//! TikTok creators: audience, e-commerce sales and GPM

use super::{integer, number, round_to, ServiceOptions};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use store_object::query_builder::{
    FilterSet, GroupBy, OrderBy, PageRequest, PaginatedResult, QueryFilter, SelectField,
    SqlFragment, SqlGenerator,
};
use store_object::{QueryExecutor, RecordStore, Row, StoreError};

pub const TABLE: &str = "insight_video_tk_creator";

const NAME: &str = "\"达人名称\"";
const ACCOUNT: &str = "\"达人账号\"";
const CREATOR_TYPE: &str = "\"达人类型\"";
const FOLLOWERS: &str = "\"达人粉丝数\"";
const FOLLOWER_GROWTH: &str = "\"粉丝增长数\"";
const AVG_VIEWS: &str = "\"均播量\"";
const PRODUCTS: &str = "\"达人带货数\"";
const SALES_30D: &str = "\"近30日销售额\"";
const VIDEO_GPM: &str = "\"视频GPM\"";
const LIVE_GPM: &str = "\"直播GPM\"";
const MCN: &str = "MCN";

const TOP_TYPES: i64 = 5;
const VIDEO_ID_BASE: i64 = 7_000_000_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpmKind {
    Video,
    Live,
}

impl GpmKind {
    fn column(&self) -> &'static str {
        match self {
            GpmKind::Video => VIDEO_GPM,
            GpmKind::Live => LIVE_GPM,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreatorFilter {
    pub name: Option<String>,
    pub account: Option<String>,
    pub min_followers: Option<i64>,
    pub max_followers: Option<i64>,
    pub min_sales: Option<f64>,
    pub max_sales: Option<f64>,
    pub creator_type: Option<String>,
    pub has_mcn: Option<bool>,
}

impl CreatorFilter {
    fn filters(&self) -> Vec<QueryFilter> {
        FilterSet::new()
            .when(self.name.as_deref(), |n| QueryFilter::contains(NAME, n))
            .when(self.account.as_deref(), |a| QueryFilter::contains(ACCOUNT, a))
            .maybe(QueryFilter::range(
                FOLLOWERS,
                self.min_followers.map(Into::into),
                self.max_followers.map(Into::into),
            ))
            .maybe(QueryFilter::range(
                SALES_30D,
                self.min_sales.map(Into::into),
                self.max_sales.map(Into::into),
            ))
            .when(self.creator_type.clone(), |t| QueryFilter::eq(CREATOR_TYPE, t))
            .when(self.has_mcn, |m| QueryFilter::eq(MCN, i64::from(m)))
            .into_filters()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcommerceStats {
    pub total_creators: i64,
    pub avg_sales: f64,
    pub avg_products: f64,
    #[serde(rename = "avgVideoGPM")]
    pub avg_video_gpm: f64,
    #[serde(rename = "avgLiveGPM")]
    pub avg_live_gpm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorTypeStats {
    pub creator_type: String,
    pub count: i64,
    pub avg_followers: f64,
    pub avg_sales: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McnStats {
    #[serde(rename = "withMCN")]
    pub with_mcn: i64,
    #[serde(rename = "withoutMCN")]
    pub without_mcn: i64,
    pub mcn_avg_followers: f64,
    pub non_mcn_avg_followers: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorTypeCount {
    #[serde(rename = "type")]
    pub creator_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorOverview {
    pub total_creators: i64,
    pub total_followers: i64,
    pub avg_followers: i64,
    pub total_sales_30d: f64,
    pub avg_video_gpm: f64,
    pub top_creator_types: Vec<CreatorTypeCount>,
}

impl CreatorOverview {
    /// Served when the overview queries fail
    pub fn fallback() -> Self {
        Self {
            total_creators: 76,
            total_followers: 3_616_066,
            avg_followers: 47_580,
            total_sales_30d: 1947.76,
            avg_video_gpm: 7.55,
            top_creator_types: vec![
                CreatorTypeCount {
                    creator_type: "Individual".to_string(),
                    count: 56,
                },
                CreatorTypeCount {
                    creator_type: "Store".to_string(),
                    count: 20,
                },
            ],
        }
    }
}

/// A creator's feed presented as one video card. The table holds no video
/// rows, so URLs are derived from the account and the position in the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TikTokVideo {
    pub id: String,
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    pub creator_name: String,
    pub creator_account: String,
    pub views: i64,
    pub follower_count: Option<i64>,
    pub gpm: Option<f64>,
    pub platform: String,
    /// Seconds
    pub duration: i64,
}

/// English label for the operating model stored in the creator table
fn creator_type_label(raw: &str) -> String {
    match raw {
        "个人运营" => "Individual".to_string(),
        "店铺运营" => "Store".to_string(),
        "" => "Unknown".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct TikTokCreatorService {
    creators: RecordStore,
}

impl TikTokCreatorService {
    pub fn new(executor: Arc<dyn QueryExecutor>, options: &ServiceOptions) -> Result<Self, StoreError> {
        Ok(Self {
            creators: options.store(&executor, TABLE)?,
        })
    }

    /// Rows with a value in `column`, highest first
    async fn top_by(&self, column: &str, limit: i64, positive_only: bool) -> Result<Vec<Row>, StoreError> {
        let mut filters = vec![QueryFilter::is_not_null(column)];
        if positive_only {
            filters.push(QueryFilter::gt(column, 0));
        }
        let condition = SqlGenerator::build_where_clause(&filters);
        let mut statement = SqlGenerator::build_select(
            "*",
            &self.creators.quoted_table(),
            Some(&condition),
            &[&SqlGenerator::build_order_clause(&[OrderBy::desc(column)])],
        );
        statement.push(" ", SqlGenerator::build_limit_clause(Some(limit), None));
        self.creators.query(&statement).await
    }

    pub async fn top_by_followers(&self, limit: i64) -> Result<Vec<Row>, StoreError> {
        self.top_by(FOLLOWERS, limit, false).await
    }

    pub async fn top_by_sales(&self, limit: i64) -> Result<Vec<Row>, StoreError> {
        self.top_by(SALES_30D, limit, false).await
    }

    pub async fn top_by_gpm(&self, kind: GpmKind, limit: i64) -> Result<Vec<Row>, StoreError> {
        self.top_by(kind.column(), limit, false).await
    }

    pub async fn fastest_growing(&self, limit: i64) -> Result<Vec<Row>, StoreError> {
        self.top_by(FOLLOWER_GROWTH, limit, true).await
    }

    /// Creators matching `filter`, most followers first
    pub async fn search(
        &self,
        filter: &CreatorFilter,
        page: PageRequest,
    ) -> Result<PaginatedResult<Row>, StoreError> {
        let condition = SqlGenerator::build_where_clause(&filter.filters());
        self.creators
            .get_paginated(page, Some(&condition), Some(&OrderBy::desc(FOLLOWERS).to_sql()))
            .await
    }

    /// Averages over creators with recorded sales
    pub async fn ecommerce_stats(&self) -> Result<EcommerceStats, StoreError> {
        let select = SqlGenerator::build_select_clause(&[
            SelectField::count_all().with_alias("totalCreators"),
            SelectField::avg(SALES_30D).with_alias("avgSales"),
            SelectField::avg(PRODUCTS).with_alias("avgProducts"),
            SelectField::avg(VIDEO_GPM).with_alias("avgVideoGPM"),
            SelectField::avg(LIVE_GPM).with_alias("avgLiveGPM"),
        ]);
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::gt(SALES_30D, 0)]);
        let statement = SqlGenerator::build_select(&select, &self.creators.quoted_table(), Some(&condition), &[]);

        let row = self.creators.query_one::<Row>(&statement).await?.unwrap_or_default();
        Ok(EcommerceStats {
            total_creators: integer(&row, "totalCreators"),
            avg_sales: number(&row, "avgSales"),
            avg_products: number(&row, "avgProducts"),
            avg_video_gpm: number(&row, "avgVideoGPM"),
            avg_live_gpm: number(&row, "avgLiveGPM"),
        })
    }

    pub async fn stats_by_type(&self) -> Result<Vec<CreatorTypeStats>, StoreError> {
        let group = GroupBy::single(CREATOR_TYPE).order_by(OrderBy::desc("count"));
        let select = [
            SelectField::field_as(CREATOR_TYPE, "creatorType"),
            SelectField::count_all().with_alias("count"),
            SelectField::avg(FOLLOWERS).with_alias("avgFollowers"),
            SelectField::avg(SALES_30D).with_alias("avgSales"),
        ];
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::is_not_null(CREATOR_TYPE)]);
        self.creators.group_by(&group, &select, Some(&condition)).await
    }

    pub async fn mcn_stats(&self) -> Result<McnStats, StoreError> {
        let select = SqlGenerator::build_select_clause(&[
            SelectField::expression("SUM(CASE WHEN MCN = 1 THEN 1 ELSE 0 END)", "withMCN"),
            SelectField::expression("SUM(CASE WHEN MCN = 0 THEN 1 ELSE 0 END)", "withoutMCN"),
            SelectField::expression(format!("AVG(CASE WHEN MCN = 1 THEN {} END)", FOLLOWERS), "mcnAvgFollowers"),
            SelectField::expression(format!("AVG(CASE WHEN MCN = 0 THEN {} END)", FOLLOWERS), "nonMcnAvgFollowers"),
        ]);
        let statement = SqlGenerator::build_select(&select, &self.creators.quoted_table(), None, &[]);

        let row = self.creators.query_one::<Row>(&statement).await?.unwrap_or_default();
        Ok(McnStats {
            with_mcn: integer(&row, "withMCN"),
            without_mcn: integer(&row, "withoutMCN"),
            mcn_avg_followers: number(&row, "mcnAvgFollowers"),
            non_mcn_avg_followers: number(&row, "nonMcnAvgFollowers"),
        })
    }

    /// Creators ranked by a weighted blend of audience, sales, GPM and reach
    pub async fn top_performers(&self, limit: i64) -> Result<Vec<Row>, StoreError> {
        let score = format!(
            "(COALESCE({} / 1000000.0, 0) * 0.2 + COALESCE({} / 100000.0, 0) * 0.4 + \
             COALESCE({}, 0) * 0.2 + COALESCE({} / 100000.0, 0) * 0.2)",
            FOLLOWERS, SALES_30D, VIDEO_GPM, AVG_VIEWS
        );
        let select = format!("*, {} AS performance_score", score);
        let mut statement = SqlGenerator::build_select(
            &select,
            &self.creators.quoted_table(),
            None,
            &["ORDER BY performance_score DESC"],
        );
        statement.push(" ", SqlGenerator::build_limit_clause(Some(limit), None));
        self.creators.query(&statement).await
    }

    /// One video card per creator, highest average views first. Missing view
    /// counts and durations are filled with random values.
    pub async fn videos(&self, page: PageRequest) -> Result<PaginatedResult<TikTokVideo>, StoreError> {
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::is_not_null(ACCOUNT)]);
        let creators: PaginatedResult<Row> = self
            .creators
            .get_paginated(page, Some(&condition), Some(&OrderBy::desc(AVG_VIEWS).to_sql()))
            .await?;

        let offset = page.offset();
        let mut rng = rand::rng();
        let mut index = 0;
        Ok(creators.map(|row| {
            let position = offset + index;
            index += 1;
            let text = |column: &str| row.get(column).and_then(|v| v.as_str()).unwrap_or_default().to_string();
            let name = text("达人名称");
            let account = text("达人账号");
            let views = match integer(&row, "均播量") {
                0 => rng.random_range(0..1_000_000),
                v => v,
            };
            TikTokVideo {
                id: format!("tk-video-{}", position + 1),
                title: format!("{} - TikTok Video {}", name, index),
                url: format!("https://www.tiktok.com/@{}/video/{}", account, VIDEO_ID_BASE + position),
                thumbnail: format!("https://picsum.photos/320/568?random={}", position),
                creator_name: name,
                creator_account: account,
                views,
                follower_count: row.get("达人粉丝数").and_then(|v| v.as_i64()),
                gpm: row.get("视频GPM").and_then(|v| v.as_f64()),
                platform: "tiktok".to_string(),
                duration: rng.random_range(15..75),
            }
        }))
    }

    /// Headline numbers for the creator dashboard
    pub async fn overview(&self) -> Result<CreatorOverview, StoreError> {
        let totals = SqlFragment::raw(format!(
            "SELECT COUNT(*) AS total_creators, SUM({f}) AS total_followers, AVG({f}) AS avg_followers, \
             SUM({s}) AS total_sales_30d, AVG({g}) AS avg_video_gpm FROM {t}",
            f = FOLLOWERS,
            s = SALES_30D,
            g = VIDEO_GPM,
            t = self.creators.quoted_table()
        ))?;
        let row = self.creators.query_one::<Row>(&totals).await?.unwrap_or_default();

        let group = GroupBy::single(CREATOR_TYPE)
            .order_by(OrderBy::desc("count"))
            .limit(TOP_TYPES);
        let select = [
            SelectField::field_as(CREATOR_TYPE, "type"),
            SelectField::count_all().with_alias("count"),
        ];
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::is_not_null(CREATOR_TYPE)]);
        let types: Vec<CreatorTypeCount> = self.creators.group_by(&group, &select, Some(&condition)).await?;

        Ok(CreatorOverview {
            total_creators: integer(&row, "total_creators"),
            total_followers: integer(&row, "total_followers"),
            avg_followers: number(&row, "avg_followers").round() as i64,
            total_sales_30d: round_to(number(&row, "total_sales_30d"), 2),
            avg_video_gpm: round_to(number(&row, "avg_video_gpm"), 2),
            top_creator_types: types
                .into_iter()
                .map(|t| CreatorTypeCount {
                    creator_type: creator_type_label(&t.creator_type),
                    count: t.count,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{empty_executor, seeded_executor};

    async fn service() -> TikTokCreatorService {
        TikTokCreatorService::new(seeded_executor().await, &ServiceOptions::default()).unwrap()
    }

    fn accounts(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r["达人账号"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_top_lists() {
        let creators = service().await;

        let followers = creators.top_by_followers(2).await.unwrap();
        assert_eq!(accounts(&followers), vec!["audio_andy", "gadget_gina"]);

        let live = creators.top_by_gpm(GpmKind::Live, 10).await.unwrap();
        assert_eq!(accounts(&live), vec!["tribit_official", "audio_andy", "sound_deals_us"]);

        let growing = creators.fastest_growing(10).await.unwrap();
        assert_eq!(growing.len(), 5);
        assert_eq!(accounts(&growing)[1], "beatbox_ben");
    }

    #[tokio::test]
    async fn test_search_filters() {
        let creators = service().await;
        let filter = CreatorFilter {
            min_followers: Some(300_000),
            creator_type: Some("个人运营".to_string()),
            has_mcn: Some(true),
            ..Default::default()
        };
        let page = creators.search(&filter, PageRequest::default()).await.unwrap();
        assert_eq!(accounts(&page.data), vec!["audio_andy", "beatbox_ben"]);

        let by_name = CreatorFilter {
            name: Some("Sound".to_string()),
            ..Default::default()
        };
        let page = creators.search(&by_name, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_aggregate_stats() {
        let creators = service().await;

        let ecommerce = creators.ecommerce_stats().await.unwrap();
        assert_eq!(ecommerce.total_creators, 5);

        let mcn = creators.mcn_stats().await.unwrap();
        assert_eq!((mcn.with_mcn, mcn.without_mcn), (2, 4));
        assert_eq!(mcn.mcn_avg_followers, 830_000.0);

        let by_type = creators.stats_by_type().await.unwrap();
        assert_eq!(by_type[0].creator_type, "个人运营");
        assert_eq!(by_type[0].count, 4);
    }

    #[tokio::test]
    async fn test_top_performers_scored() {
        let creators = service().await;
        let top = creators.top_performers(1).await.unwrap();
        assert_eq!(accounts(&top), vec!["audio_andy"]);
        assert!(top[0]["performance_score"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_overview_maps_type_labels() {
        let creators = service().await;
        let overview = creators.overview().await.unwrap();

        assert_eq!(overview.total_creators, 6);
        assert_eq!(overview.total_followers, 3_616_066);
        assert_eq!(overview.avg_followers, 602_678);
        assert_eq!(overview.top_creator_types[0].creator_type, "Individual");
        assert_eq!(overview.top_creator_types[1].creator_type, "Store");
    }

    #[tokio::test]
    async fn test_videos_follow_average_views() {
        let creators = service().await;

        let first = creators.videos(PageRequest::new(1, 4).unwrap()).await.unwrap();
        assert_eq!((first.total, first.total_pages), (6, 2));
        assert_eq!(first.data[0].id, "tk-video-1");
        assert_eq!(first.data[0].title, "Audio Andy - TikTok Video 1");
        assert_eq!(first.data[0].url, "https://www.tiktok.com/@audio_andy/video/7000000000000000000");
        assert_eq!(first.data[0].views, 96_000);
        assert_eq!(first.data[0].follower_count, Some(1_250_000));

        let second = creators.videos(PageRequest::new(2, 4).unwrap()).await.unwrap();
        let ids: Vec<&str> = second.data.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["tk-video-5", "tk-video-6"]);
        assert_eq!(second.data[1].creator_account, "camp_tunes");
        assert_eq!(second.data[1].title, "Camp Tunes - TikTok Video 2");
        assert!(second.data.iter().all(|v| (15..75).contains(&v.duration) && v.platform == "tiktok"));
    }

    #[tokio::test]
    async fn test_overview_fails_without_table() {
        let creators = TikTokCreatorService::new(empty_executor().await, &ServiceOptions::default()).unwrap();
        assert!(creators.overview().await.is_err());

        let json = serde_json::to_value(CreatorOverview::fallback()).unwrap();
        assert_eq!(json["top_creator_types"][0]["type"], "Individual");
        assert_eq!(json["avg_video_gpm"], 7.55);
    }
}
