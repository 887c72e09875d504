//! HTTP surface
//!
//! [`router`] mounts every route under `/api` on an [`AppContext`] state.
//! Handlers validate parameters through [`params::ValidQuery`] and
//! [`params::ValidJson`], answer with the [`envelope`] shapes and report
//! failures as [`error::ApiError`].

pub mod envelope;
pub mod error;
pub mod handlers;
pub mod params;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::AppContext;
use handlers::{campaigns, health, insight, kol, self_media, testing};

pub use error::ApiError;

pub fn router(context: AppContext) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/health/db", get(health::health_db))
        .route("/api/kol", get(kol::list))
        .route("/api/kol/statistics", get(kol::statistics))
        .route("/api/kol/india", get(kol::india))
        .route("/api/kol/videos", get(kol::videos))
        .route("/api/kol/{id}", get(kol::detail))
        .route("/api/kol2024", get(kol::list_2024))
        .route("/api/kol2024/platforms", get(kol::platforms_2024))
        .route("/api/kol2024/suggestions", get(kol::suggestions_2024))
        .route("/api/insight/search", get(insight::search))
        .route("/api/insight/search/suggestions", get(insight::suggestions))
        .route("/api/insight/video/tiktok/creators", get(insight::tiktok_creators))
        .route("/api/insight/video/tiktok/products", get(insight::tiktok_products))
        .route("/api/insight/video/tiktok/stats", get(insight::tiktok_stats))
        .route("/api/insight/video/tiktok/videos", get(insight::tiktok_videos))
        .route("/api/insight/video/tiktok/relations", get(insight::tiktok_relations))
        .route("/api/insight/consumer-voice", get(insight::consumer_voice))
        .route("/api/insight/consumer-voice/competitive", get(insight::competitive))
        .route("/api/selfmedia/accounts", get(self_media::accounts))
        .route("/api/selfmedia/accounts/top", get(self_media::top_accounts))
        .route("/api/selfmedia/search", get(self_media::search))
        .route("/api/selfmedia/stats", get(self_media::stats))
        .route("/api/selfmedia/account/{name}", get(self_media::account))
        .route("/api/selfmedia/{platform}", get(self_media::content))
        .route("/api/selfmedia/{platform}/top", get(self_media::top_content))
        .route("/api/ads", get(campaigns::ads))
        .route("/api/ads/metrics", get(campaigns::ad_metrics))
        .route("/api/ads/platforms", get(campaigns::ad_platforms))
        .route("/api/ads/{id}", get(campaigns::ad))
        .route("/api/private/stats", get(campaigns::private_stats))
        .route("/api/private/{channel}", get(campaigns::private_channel))
        .route("/api/testing", get(testing::ideas).post(testing::create_idea))
        .route("/api/testing/active", get(testing::active))
        .route("/api/testing/executions", get(testing::executions))
        .route("/api/testing/{id}", get(testing::idea))
        .route("/api/cache/stats", get(handlers::cache_stats))
        .route("/api/cache/clear", post(handlers::cache_clear))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(context)
}
