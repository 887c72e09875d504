//! Validated request extractors and query-string shapes

use super::error::ApiError;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use store_object::{PageRequest, SortOrder, MAX_PAGE};
use validator::Validate;

use crate::services::ads::{AdPlatform, CampaignFilter, CampaignStatus};
use crate::services::consumer_voice::VoiceFilter;
use crate::services::insight_search::InsightFilter;
use crate::services::kol::{KolFilter, VideoFilter};
use crate::services::kol_2024::Kol2024Filter;
use crate::services::private_channel::{ChannelQuery, DEFAULT_LIMIT};
use crate::services::self_media::{AccountFilter, ContentFilter};
use crate::services::testing::{ExecutionFilter, ExecutionStatus, IdeaFilter, IdeaStatus, Priority};
use crate::services::tiktok_creator::CreatorFilter;
use crate::services::tiktok_product::ProductFilter;

/// Query string deserialized with `Query<T>` and checked with `Validate`
pub struct ValidQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        value.validate()?;
        Ok(ValidQuery(value))
    }
}

/// JSON body deserialized with `Json<T>` and checked with `Validate`.
/// Malformed JSON is rejected with `INVALID_BODY`.
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

pub(crate) const DEFAULT_PAGE_SIZE: i64 = 20;

fn page_request(page: Option<i64>, page_size: Option<i64>, default_size: i64) -> Result<PageRequest, ApiError> {
    Ok(PageRequest::new(page.unwrap_or(1), page_size.unwrap_or(default_size))?)
}

fn sort_order(order: Option<&str>) -> Result<Option<SortOrder>, ApiError> {
    match order {
        None => Ok(None),
        Some(value) => SortOrder::parse(value)
            .map(Some)
            .ok_or_else(|| ApiError::invalid_param("order", "must be 'asc' or 'desc'")),
    }
}

/// Split a comma separated parameter, dropping blanks
fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::invalid_param(field, "expected a YYYY-MM-DD date")),
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct KolQuery {
    #[validate(range(min = 1, max = MAX_PAGE))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub page_size: Option<i64>,
    pub q: Option<String>,
    pub search: Option<String>,
    pub platform: Option<String>,
    pub region: Option<String>,
}

impl KolQuery {
    pub fn page(&self) -> Result<PageRequest, ApiError> {
        page_request(self.page, self.page_size, DEFAULT_PAGE_SIZE)
    }

    /// `q` wins over `search`
    pub fn term(&self) -> Option<String> {
        non_blank(&self.q).or_else(|| non_blank(&self.search))
    }

    pub fn filter(&self) -> KolFilter {
        KolFilter {
            keyword: None,
            platform: non_blank(&self.platform),
            region: non_blank(&self.region),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VideoQuery {
    #[validate(range(min = 1, max = MAX_PAGE))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub page_size: Option<i64>,
    /// Free-text match on title or channel
    pub search: Option<String>,
    pub youtuber: Option<String>,
    #[validate(range(min = 0))]
    pub min_views: Option<i64>,
}

impl VideoQuery {
    pub fn page(&self) -> Result<PageRequest, ApiError> {
        page_request(self.page, self.page_size, DEFAULT_PAGE_SIZE)
    }

    pub fn term(&self) -> Option<String> {
        non_blank(&self.search)
    }

    pub fn filter(&self) -> VideoFilter {
        VideoFilter {
            youtuber: non_blank(&self.youtuber),
            min_views: self.min_views,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Kol2024Query {
    #[validate(range(min = 1, max = MAX_PAGE))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub platform: Option<String>,
    pub order_by: Option<String>,
    pub order: Option<String>,
}

impl Kol2024Query {
    pub fn page(&self) -> Result<PageRequest, ApiError> {
        page_request(self.page, self.page_size, DEFAULT_PAGE_SIZE)
    }

    pub fn filter(&self) -> Result<Kol2024Filter, ApiError> {
        Ok(Kol2024Filter {
            keyword: non_blank(&self.search),
            platform: non_blank(&self.platform),
            order_by: non_blank(&self.order_by),
            order: sort_order(self.order.as_deref())?,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SuggestionQuery {
    #[validate(length(min = 1, max = 100))]
    pub q: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InsightQuery {
    #[validate(range(min = 1, max = MAX_PAGE))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub page_size: Option<i64>,
    /// Comma separated; any match
    pub keyword: Option<String>,
    pub region: Option<String>,
    pub language: Option<String>,
    #[validate(range(min = 0))]
    pub min_volume: Option<i64>,
    #[validate(range(min = 0))]
    pub max_volume: Option<i64>,
    #[serde(rename = "minCPC")]
    #[validate(range(min = 0.0))]
    pub min_cpc: Option<f64>,
    #[serde(rename = "maxCPC")]
    #[validate(range(min = 0.0))]
    pub max_cpc: Option<f64>,
}

impl InsightQuery {
    pub fn page(&self) -> Result<PageRequest, ApiError> {
        page_request(self.page, self.page_size, DEFAULT_PAGE_SIZE)
    }

    pub fn filter(&self) -> InsightFilter {
        InsightFilter {
            keywords: split_list(self.keyword.as_deref()),
            regions: split_list(self.region.as_deref()),
            languages: split_list(self.language.as_deref()),
            min_volume: self.min_volume,
            max_volume: self.max_volume,
            min_cpc: self.min_cpc,
            max_cpc: self.max_cpc,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct InsightSuggestionQuery {
    #[validate(length(min = 1, max = 100))]
    pub keyword: String,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatorQuery {
    #[validate(range(min = 1, max = MAX_PAGE))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub account: Option<String>,
    #[validate(range(min = 0))]
    pub min_followers: Option<i64>,
    #[validate(range(min = 0))]
    pub max_followers: Option<i64>,
    #[validate(range(min = 0.0))]
    pub min_sales: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max_sales: Option<f64>,
    #[serde(rename = "type")]
    pub creator_type: Option<String>,
    pub has_mcn: Option<bool>,
}

impl CreatorQuery {
    pub fn page(&self) -> Result<PageRequest, ApiError> {
        page_request(self.page, self.page_size, DEFAULT_PAGE_SIZE)
    }

    pub fn filter(&self) -> CreatorFilter {
        CreatorFilter {
            name: non_blank(&self.search),
            account: non_blank(&self.account),
            min_followers: self.min_followers,
            max_followers: self.max_followers,
            min_sales: self.min_sales,
            max_sales: self.max_sales,
            creator_type: non_blank(&self.creator_type),
            has_mcn: self.has_mcn,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[validate(range(min = 1, max = MAX_PAGE))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    #[validate(range(min = 0.0))]
    pub min_price: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max_price: Option<f64>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub min_rating: Option<f64>,
    #[validate(range(min = 0))]
    pub min_sales: Option<i64>,
    pub shop: Option<String>,
    pub operation_mode: Option<String>,
}

impl ProductQuery {
    pub fn page(&self) -> Result<PageRequest, ApiError> {
        page_request(self.page, self.page_size, DEFAULT_PAGE_SIZE)
    }

    pub fn filter(&self) -> ProductFilter {
        ProductFilter {
            name: non_blank(&self.search),
            category: non_blank(&self.category),
            region: non_blank(&self.region),
            min_price: self.min_price,
            max_price: self.max_price,
            min_rating: self.min_rating,
            min_sales: self.min_sales,
            shop_name: non_blank(&self.shop),
            operation_mode: non_blank(&self.operation_mode),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct AdsQuery {
    /// Comma separated platform names
    pub platforms: Option<String>,
    /// Comma separated campaign statuses
    pub status: Option<String>,
}

impl AdsQuery {
    pub fn filter(&self) -> Result<CampaignFilter, ApiError> {
        let platforms = split_list(self.platforms.as_deref())
            .iter()
            .map(|p| {
                AdPlatform::parse(p).ok_or_else(|| ApiError::invalid_param("platforms", format!("unknown platform '{p}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let statuses = split_list(self.status.as_deref())
            .iter()
            .map(|s| {
                CampaignStatus::parse(s).ok_or_else(|| ApiError::invalid_param("status", format!("unknown status '{s}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CampaignFilter { platforms, statuses })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct DailyQuery {
    #[validate(range(min = 1, max = 365))]
    pub days: Option<u32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PrivateQuery {
    #[validate(range(min = 1, max = MAX_PAGE))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl PrivateQuery {
    pub fn channel_query(&self) -> Result<ChannelQuery, ApiError> {
        Ok(ChannelQuery {
            page: page_request(self.page, self.limit, DEFAULT_LIMIT)?,
            date_from: parse_date("dateFrom", self.date_from.as_deref())?,
            date_to: parse_date("dateTo", self.date_to.as_deref())?,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IdeaQuery {
    #[validate(range(min = 1, max = MAX_PAGE))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub page_size: Option<i64>,
    pub status: Option<IdeaStatus>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
}

impl IdeaQuery {
    pub fn page(&self) -> Result<PageRequest, ApiError> {
        page_request(self.page, self.page_size, 10)
    }

    pub fn filter(&self) -> IdeaFilter {
        IdeaFilter {
            status: self.status,
            priority: self.priority,
            search: non_blank(&self.search),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionQuery {
    pub status: Option<ExecutionStatus>,
    pub idea_id: Option<String>,
}

impl ExecutionQuery {
    pub fn filter(&self) -> ExecutionFilter {
        ExecutionFilter {
            status: self.status,
            idea_id: non_blank(&self.idea_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_bounds() {
        let query = KolQuery {
            page_size: Some(0),
            ..Default::default()
        };
        assert!(query.validate().is_err());

        let query = KolQuery {
            page: Some(2),
            page_size: Some(100),
            ..Default::default()
        };
        assert!(query.validate().is_ok());
        let page = query.page().unwrap();
        assert_eq!((page.page(), page.page_size()), (2, 100));
    }

    #[test]
    fn test_kol_term_prefers_q() {
        let query = KolQuery {
            q: Some("  ".into()),
            search: Some("tech".into()),
            ..Default::default()
        };
        assert_eq!(query.term().as_deref(), Some("tech"));
    }

    #[test]
    fn test_insight_lists_are_split() {
        let query = InsightQuery {
            keyword: Some("speaker, earbuds,,".into()),
            region: Some("US".into()),
            ..Default::default()
        };
        let filter = query.filter();
        assert_eq!(filter.keywords, vec!["speaker", "earbuds"]);
        assert_eq!(filter.regions, vec!["US"]);
        assert!(filter.languages.is_empty());
    }

    #[test]
    fn test_invalid_order_is_rejected() {
        let query = Kol2024Query {
            order: Some("sideways".into()),
            ..Default::default()
        };
        assert!(query.filter().is_err());

        let query = Kol2024Query {
            order: Some("DESC".into()),
            ..Default::default()
        };
        assert_eq!(query.filter().unwrap().order, Some(SortOrder::Desc));
    }

    #[test]
    fn test_ads_filter_parses_lists() {
        let query = AdsQuery {
            platforms: Some("facebook,TikTok".into()),
            status: None,
        };
        let filter = query.filter().unwrap();
        assert_eq!(filter.platforms, vec![AdPlatform::Facebook, AdPlatform::Tiktok]);

        let query = AdsQuery {
            platforms: Some("myspace".into()),
            status: None,
        };
        assert!(query.filter().is_err());
    }

    #[test]
    fn test_private_dates() {
        let query = PrivateQuery {
            date_from: Some("2024-01-15".into()),
            ..Default::default()
        };
        let channel = query.channel_query().unwrap();
        assert_eq!(channel.date_from, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(channel.page.page_size(), DEFAULT_LIMIT);

        let query = PrivateQuery {
            date_to: Some("15/01/2024".into()),
            ..Default::default()
        };
        assert!(query.channel_query().is_err());
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[validate(range(min = 1, max = MAX_PAGE))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub page_size: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> Result<PageRequest, ApiError> {
        page_request(self.page, self.page_size, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IndiaQuery {
    #[validate(range(min = 1, max = MAX_PAGE))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub page_size: Option<i64>,
    pub platform: Option<String>,
}

impl IndiaQuery {
    pub fn page(&self) -> Result<PageRequest, ApiError> {
        page_request(self.page, self.page_size, DEFAULT_PAGE_SIZE)
    }

    pub fn platform(&self) -> Option<String> {
        non_blank(&self.platform)
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct TopQuery {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContentQuery {
    #[validate(range(min = 1, max = MAX_PAGE))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub page_size: Option<i64>,
    pub account: Option<String>,
    #[validate(range(min = 0))]
    pub min_views: Option<i64>,
    #[validate(range(min = 0))]
    pub min_likes: Option<i64>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl ContentQuery {
    pub fn page(&self) -> Result<PageRequest, ApiError> {
        page_request(self.page, self.page_size, DEFAULT_PAGE_SIZE)
    }

    pub fn filter(&self) -> Result<ContentFilter, ApiError> {
        Ok(ContentFilter {
            account: non_blank(&self.account),
            min_views: self.min_views,
            min_likes: self.min_likes,
            date_from: parse_date("dateFrom", self.date_from.as_deref())?,
            date_to: parse_date("dateTo", self.date_to.as_deref())?,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AccountQuery {
    #[validate(range(min = 1, max = MAX_PAGE))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100))]
    pub page_size: Option<i64>,
    pub platform: Option<String>,
    #[validate(range(min = 0))]
    pub min_followers: Option<i64>,
}

impl AccountQuery {
    pub fn page(&self) -> Result<PageRequest, ApiError> {
        page_request(self.page, self.page_size, DEFAULT_PAGE_SIZE)
    }

    pub fn filter(&self) -> AccountFilter {
        AccountFilter {
            platform: non_blank(&self.platform),
            min_followers: self.min_followers,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ConsumerVoiceQuery {
    #[validate(length(max = 10))]
    pub region: Option<String>,
    #[validate(length(max = 10))]
    pub language: Option<String>,
    #[validate(length(max = 50))]
    pub category: Option<String>,
}

impl ConsumerVoiceQuery {
    pub fn filter(&self) -> VoiceFilter {
        VoiceFilter {
            region: non_blank(&self.region),
            language: non_blank(&self.language),
            category: non_blank(&self.category),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CompetitiveQuery {
    #[validate(length(min = 1, max = 100))]
    pub keyword: String,
}
