use axum::extract::{Path, State};
use serde_json::{json, Value};
use store_object::{PaginatedResult, Row};

use crate::api::envelope::{paginated, success, PaginatedBody, SuccessBody};
use crate::api::error::ApiError;
use crate::api::params::{IndiaQuery, KolQuery, Kol2024Query, SuggestionQuery, ValidQuery, VideoQuery};
use crate::core::AppContext;
use crate::services::kol::{KolStatistics, ACCOUNT};
use crate::services::kol_2024::PlatformShare;
use crate::services::OrFallback;

const DETAIL_VIDEOS: usize = 10;

/// Account list, or a search over name and URL when `q`/`search` is given
pub async fn list(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<KolQuery>,
) -> Result<PaginatedBody<Row>, ApiError> {
    let page = query.page()?;
    if let Some(term) = query.term() {
        let matches = context.kol().search_accounts(&term).await?;
        return Ok(paginated(PaginatedResult::from_slice(&matches, page)).with_message("KOL search results"));
    }

    let result = context.kol().list_accounts(&query.filter(), page).await?;
    Ok(paginated(result).with_message("KOL list retrieved successfully"))
}

/// India roster, newest first, optionally for one platform
pub async fn india(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<IndiaQuery>,
) -> Result<PaginatedBody<Row>, ApiError> {
    let platform = query.platform();
    let result = context.kol().india_list(platform.as_deref(), query.page()?).await?;
    Ok(paginated(result).with_message("India KOL list retrieved successfully"))
}

pub async fn statistics(State(context): State<AppContext>) -> SuccessBody<KolStatistics> {
    let statistics = context
        .kol()
        .statistics()
        .await
        .or_fallback("kol statistics", KolStatistics::fallback);
    success(statistics).with_message("KOL statistics retrieved successfully")
}

/// Video list, or a title/channel search when `search` is given
pub async fn videos(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<VideoQuery>,
) -> Result<PaginatedBody<Row>, ApiError> {
    let page = query.page()?;
    if let Some(term) = query.term() {
        let matches = context.kol().search_videos(&term).await?;
        return Ok(paginated(PaginatedResult::from_slice(&matches, page)).with_message("KOL video search results"));
    }

    let result = context.kol().list_videos(&query.filter(), page).await?;
    Ok(paginated(result).with_message("KOL videos retrieved successfully"))
}

/// One account with its ten top videos and the overall distributions
pub async fn detail(
    State(context): State<AppContext>,
    Path(id): Path<String>,
) -> Result<SuccessBody<Value>, ApiError> {
    let kol = context
        .kol()
        .find_account(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("KOL not found"))?;

    let account = kol.get(ACCOUNT).and_then(Value::as_str).unwrap_or_default().to_string();
    let (videos, platforms, regions) = tokio::try_join!(
        context.kol().videos_for_account(&account),
        context.kol().platform_stats(),
        context.kol().region_stats(),
    )?;

    let total_videos = videos.len();
    let top_videos: Vec<Row> = videos.into_iter().take(DETAIL_VIDEOS).collect();
    Ok(success(json!({
        "kol": kol,
        "videos": top_videos,
        "relatedStats": {
            "totalVideos": total_videos,
            "platformDistribution": platforms,
            "regionDistribution": regions,
        },
    }))
    .with_message("KOL details retrieved successfully"))
}

pub async fn list_2024(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<Kol2024Query>,
) -> Result<PaginatedBody<Row>, ApiError> {
    let result = context.kol_2024().list(&query.filter()?, query.page()?).await?;
    Ok(paginated(result))
}

pub async fn platforms_2024(State(context): State<AppContext>) -> Result<SuccessBody<Vec<PlatformShare>>, ApiError> {
    Ok(success(context.kol_2024().platform_stats().await?))
}

pub async fn suggestions_2024(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<SuggestionQuery>,
) -> Result<SuccessBody<Vec<String>>, ApiError> {
    Ok(success(context.kol_2024().account_suggestions(query.q.trim()).await?))
}
