//! Ad campaigns and private-channel analytics

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::envelope::{success, timestamp, SuccessBody};
use crate::api::error::ApiError;
use crate::api::params::{AdsQuery, DailyQuery, PrivateQuery, ValidQuery};
use crate::core::AppContext;
use crate::services::ads::{AdCampaign, PlatformMetrics};
use crate::services::private_channel::{Channel, ChannelPage};

const DEFAULT_DAYS: u32 = 30;

pub async fn ads(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<AdsQuery>,
) -> Result<Json<Value>, ApiError> {
    let campaigns = context.ads().campaigns(&query.filter()?);
    Ok(Json(json!({
        "success": true,
        "count": campaigns.len(),
        "data": campaigns,
        "timestamp": timestamp(),
    })))
}

pub async fn ad(
    State(context): State<AppContext>,
    Path(id): Path<String>,
) -> Result<SuccessBody<AdCampaign>, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::invalid_param("id", "campaign id must be an integer"))?;
    context
        .ads()
        .campaign(id)
        .map(success)
        .ok_or_else(|| ApiError::not_found("Campaign not found"))
}

pub async fn ad_metrics(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<DailyQuery>,
) -> SuccessBody<Value> {
    let ads = context.ads();
    success(json!({
        "overview": ads.metrics(),
        "daily": ads.daily_metrics(query.days.unwrap_or(DEFAULT_DAYS)),
        "geographic": ads.geographic_metrics(),
    }))
}

pub async fn ad_platforms(State(context): State<AppContext>) -> SuccessBody<Vec<PlatformMetrics>> {
    success(context.ads().platform_metrics())
}

fn channel_body<T: Serialize>(page: ChannelPage<T>) -> Response {
    Json(json!({
        "success": true,
        "data": page.data,
        "pagination": page.pagination,
        "timestamp": timestamp(),
    }))
    .into_response()
}

/// One private channel, filtered by `dateFrom`/`dateTo` and paged by `page`/`limit`
pub async fn private_channel(
    State(context): State<AppContext>,
    Path(channel): Path<String>,
    ValidQuery(query): ValidQuery<PrivateQuery>,
) -> Result<Response, ApiError> {
    let channel = Channel::parse(&channel).ok_or_else(|| ApiError::not_found(format!("Unknown channel '{channel}'")))?;
    let query = query.channel_query()?;
    let service = context.private_channels();

    Ok(match channel {
        Channel::Edm => channel_body(service.edm_campaigns(&query)),
        Channel::Linkedin => channel_body(service.linkedin_posts(&query)),
        Channel::Shopify => channel_body(service.shopify_days(&query)),
        Channel::Whatsapp => channel_body(service.whatsapp_campaigns(&query)),
        Channel::Lifecycle => channel_body(service.lifecycle(&query)),
    })
}

pub async fn private_stats(State(context): State<AppContext>) -> SuccessBody<Value> {
    let service = context.private_channels();
    success(json!({
        "channels": service.channel_stats(),
        "funnel": service.conversion_funnel(),
    }))
}
