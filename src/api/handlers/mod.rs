//! Route handlers, one module per area

pub mod campaigns;
pub mod health;
pub mod insight;
pub mod kol;
pub mod self_media;
pub mod testing;

use axum::extract::State;
use cache_system::CacheStats;
use tracing::info;

use super::envelope::{success, SuccessBody};
use crate::core::AppContext;

pub async fn cache_stats(State(context): State<AppContext>) -> SuccessBody<CacheStats> {
    success(context.cache().stats())
}

pub async fn cache_clear(State(context): State<AppContext>) -> SuccessBody<CacheStats> {
    context.cache().clear();
    info!("result cache cleared");
    success(context.cache().stats()).with_message("Cache cleared")
}
