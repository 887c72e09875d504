use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use store_object::db_utils::{database_stats, table_exists};
use tracing::{error, warn};

use crate::api::envelope::timestamp;
use crate::core::AppContext;
use crate::migration::FALLBACK_TABLES;

pub async fn health(State(context): State<AppContext>) -> Response {
    match context.health_check().await {
        Ok(()) => Json(json!({
            "status": "healthy",
            "timestamp": timestamp(),
            "database": "connected",
            "environment": context.config().database.environment,
            "version": env!("CARGO_PKG_VERSION"),
        }))
        .into_response(),
        Err(e) => {
            warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "timestamp": timestamp(),
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

pub async fn health_db(State(context): State<AppContext>) -> Response {
    if let Err(e) = context.health_check().await {
        error!(error = %e, "database health check failed");
        let status = if e.is_unavailable() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        return (
            status,
            Json(json!({
                "status": "unhealthy",
                "database": "error",
                "error": e.to_string(),
                "timestamp": timestamp(),
            })),
        )
            .into_response();
    }

    let executor = context.executor().as_ref();
    let mut missing_tables = Vec::new();
    for &table in FALLBACK_TABLES {
        match table_exists(executor, table).await {
            Ok(true) => {}
            Ok(false) => missing_tables.push(table),
            Err(e) => {
                warn!(table, error = %e, "table lookup failed");
                missing_tables.push(table);
            }
        }
    }
    let stats = match database_stats(executor).await {
        Ok(stats) => Some(stats),
        Err(e) => {
            warn!(error = %e, "database stats unavailable");
            None
        }
    };

    let remote = if context.config().database.remote_url.is_some() {
        "enabled"
    } else {
        "disabled"
    };
    Json(json!({
        "status": "healthy",
        "database": context.backend(),
        "turso": remote,
        "timestamp": timestamp(),
        "test": [{ "test": 1 }],
        "missingTables": missing_tables,
        "stats": stats,
    }))
    .into_response()
}
