//! Brand-owned Instagram, YouTube and TikTok content

use axum::extract::{Path, State};
use serde_json::{json, Value};
use store_object::Row;

use crate::api::envelope::{paginated, success, PaginatedBody, SuccessBody};
use crate::api::error::ApiError;
use crate::api::params::{AccountQuery, ContentQuery, SuggestionQuery, TopQuery, ValidQuery};
use crate::core::AppContext;
use crate::services::self_media::{AccountContent, CrossPlatformResults, SelfMediaPlatform};

const DEFAULT_TOP: i64 = 10;

fn platform(raw: &str) -> Result<SelfMediaPlatform, ApiError> {
    SelfMediaPlatform::parse(raw).ok_or_else(|| ApiError::not_found(format!("Unknown platform '{raw}'")))
}

/// Posts of one platform, filtered by account, views, likes and date
pub async fn content(
    State(context): State<AppContext>,
    Path(raw): Path<String>,
    ValidQuery(query): ValidQuery<ContentQuery>,
) -> Result<PaginatedBody<Row>, ApiError> {
    let platform = platform(&raw)?;
    let result = context
        .self_media()
        .list(platform, &query.filter()?, query.page()?)
        .await?;
    Ok(paginated(result).with_message(format!("{} content retrieved successfully", platform.label())))
}

pub async fn top_content(
    State(context): State<AppContext>,
    Path(raw): Path<String>,
    ValidQuery(query): ValidQuery<TopQuery>,
) -> Result<SuccessBody<Vec<Row>>, ApiError> {
    let platform = platform(&raw)?;
    let rows = context
        .self_media()
        .top(platform, query.limit.unwrap_or(DEFAULT_TOP))
        .await?;
    Ok(success(rows))
}

pub async fn accounts(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<AccountQuery>,
) -> Result<PaginatedBody<Row>, ApiError> {
    let result = context.self_media().accounts(&query.filter(), query.page()?).await?;
    Ok(paginated(result))
}

pub async fn top_accounts(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<TopQuery>,
) -> Result<SuccessBody<Vec<Row>>, ApiError> {
    let rows = context
        .self_media()
        .top_accounts(query.limit.unwrap_or(DEFAULT_TOP))
        .await?;
    Ok(success(rows))
}

pub async fn search(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<SuggestionQuery>,
) -> Result<SuccessBody<CrossPlatformResults>, ApiError> {
    let results = context.self_media().search_across_platforms(query.q.trim()).await?;
    Ok(success(results))
}

pub async fn account(
    State(context): State<AppContext>,
    Path(name): Path<String>,
) -> Result<SuccessBody<AccountContent>, ApiError> {
    Ok(success(context.self_media().account_content(&name).await?))
}

pub async fn stats(State(context): State<AppContext>) -> Result<SuccessBody<Value>, ApiError> {
    let service = context.self_media();
    let (overall, comparison) = tokio::try_join!(service.overall_stats(), service.platform_comparison())?;
    Ok(success(json!({
        "overall": overall,
        "platforms": comparison,
    })))
}
