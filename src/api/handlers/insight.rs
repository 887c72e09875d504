use axum::extract::State;
use serde_json::json;
use store_object::Row;

use crate::api::envelope::{paginated, success, timestamp, PaginatedBody, SuccessBody};
use crate::api::error::ApiError;
use crate::api::params::{
    CompetitiveQuery, ConsumerVoiceQuery, CreatorQuery, InsightQuery, InsightSuggestionQuery, PageQuery,
    ProductQuery, ValidQuery,
};
use crate::core::AppContext;
use crate::services::consumer_voice::{CompetitiveInsight, Sensitivity};
use crate::services::tiktok_creator::{CreatorOverview, TikTokVideo};
use crate::services::tiktok_product::{CreatorProductRelation, ProductOverview};
use crate::services::OrFallback;

const DEFAULT_SUGGESTIONS: i64 = 10;
const TOP_REGIONS: usize = 5;
const TOP_LANGUAGES: usize = 5;
const TOP_MODIFIERS: usize = 10;
const TRENDING_TOPICS: i64 = 20;
const OVERVIEW_TOPICS: usize = 5;
const TOP_NEEDS: usize = 10;
const TOP_DEMAND: usize = 10;
const TOP_PRICE_ROWS: usize = 20;
const TOP_REGIONAL: usize = 10;

/// Advanced keyword search. Without keyword, region or language narrowing the
/// response also carries the region, language and modifier breakdowns.
pub async fn search(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<InsightQuery>,
) -> Result<PaginatedBody<Row>, ApiError> {
    let filter = query.filter();
    let service = context.insight();
    let result = service.advanced_search(&filter, query.page()?).await?;
    let body = paginated(result).with_message("Search insights retrieved successfully");

    if !filter.is_unscoped() {
        return Ok(body);
    }

    crate::debug_log!("unscoped insight search, attaching statistics");
    let (mut regions, mut languages, mut modifiers) = tokio::try_join!(
        service.volume_by_region(),
        service.keyword_count_by_language(),
        service.modifier_stats(),
    )?;
    regions.truncate(TOP_REGIONS);
    languages.truncate(TOP_LANGUAGES);
    modifiers.truncate(TOP_MODIFIERS);

    Ok(body.with_extra(
        "statistics",
        json!({
            "byRegion": regions,
            "byLanguage": languages,
            "topModifiers": modifiers,
        }),
    ))
}

pub async fn suggestions(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<InsightSuggestionQuery>,
) -> Result<SuccessBody<Vec<String>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_SUGGESTIONS);
    Ok(success(context.insight().suggestions(query.keyword.trim(), limit).await?))
}

pub async fn tiktok_creators(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<CreatorQuery>,
) -> Result<PaginatedBody<Row>, ApiError> {
    let result = context.creators().search(&query.filter(), query.page()?).await?;
    Ok(paginated(result))
}

pub async fn tiktok_products(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<ProductQuery>,
) -> Result<PaginatedBody<Row>, ApiError> {
    let result = context.products().search(&query.filter(), query.page()?).await?;
    Ok(paginated(result))
}

/// Creator and product overviews, each degrading to its demo figures
pub async fn tiktok_stats(State(context): State<AppContext>) -> SuccessBody<serde_json::Value> {
    let (creators, products) = tokio::join!(context.creators().overview(), context.products().overview());
    success(json!({
        "creators": creators.or_fallback("tiktok creator overview", CreatorOverview::fallback),
        "products": products.or_fallback("tiktok product overview", ProductOverview::fallback),
    }))
}

pub async fn tiktok_videos(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> Result<PaginatedBody<TikTokVideo>, ApiError> {
    Ok(paginated(context.creators().videos(query.page()?).await?))
}

pub async fn tiktok_relations(
    State(context): State<AppContext>,
) -> Result<SuccessBody<Vec<CreatorProductRelation>>, ApiError> {
    Ok(success(context.products().creator_product_relation().await?))
}

/// Consumer needs, intent, trends, demand, price sensitivity and regional
/// preferences in one report, optionally narrowed by region, language and category
pub async fn consumer_voice(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<ConsumerVoiceQuery>,
) -> Result<SuccessBody<serde_json::Value>, ApiError> {
    let filter = query.filter();
    let region = filter.region.as_deref();
    let service = context.consumer_voice();
    let (needs, intent, trending, insights, demand, prices, regional) = tokio::try_join!(
        service.consumer_needs(region, filter.language.as_deref()),
        service.search_intent(region),
        service.trending_topics(TRENDING_TOPICS),
        service.consumer_insights(&filter),
        service.product_demand(),
        service.price_sensitivity(),
        service.regional_preferences(),
    )?;

    let average_demand = if demand.is_empty() {
        0.0
    } else {
        demand.iter().map(|d| d.demand_score).sum::<f64>() / demand.len() as f64
    };
    let share = |level: Sensitivity| prices.iter().filter(|p| p.price_sensitivity == level).count();

    Ok(success(json!({
        "overview": {
            "totalNeeds": needs.len(),
            "totalInsights": insights.len(),
            "topTrendingTopics": &trending[..trending.len().min(OVERVIEW_TOPICS)],
        },
        "consumerNeeds": &needs[..needs.len().min(TOP_NEEDS)],
        "searchIntent": intent,
        "insights": insights,
        "productDemand": {
            "topCategories": &demand[..demand.len().min(TOP_DEMAND)],
            "summary": {
                "totalCategories": demand.len(),
                "averageDemandScore": average_demand,
            },
        },
        "priceSensitivity": {
            "analysis": &prices[..prices.len().min(TOP_PRICE_ROWS)],
            "distribution": {
                "high": share(Sensitivity::High),
                "medium": share(Sensitivity::Medium),
                "low": share(Sensitivity::Low),
            },
        },
        "regionalPreferences": &regional[..regional.len().min(TOP_REGIONAL)],
        "metadata": {
            "filters": {
                "region": filter.region.as_deref().unwrap_or("all"),
                "language": filter.language.as_deref().unwrap_or("all"),
                "category": filter.category.as_deref().unwrap_or("all"),
            },
            "generatedAt": timestamp(),
        },
    }))
    .with_message("Consumer voice analysis retrieved successfully"))
}

pub async fn competitive(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<CompetitiveQuery>,
) -> Result<SuccessBody<CompetitiveInsight>, ApiError> {
    let keyword = query.keyword.trim();
    if keyword.is_empty() {
        return Err(ApiError::invalid_param("keyword", "must not be blank"));
    }
    Ok(success(context.consumer_voice().competitive_insights(keyword).await?))
}
