use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::json;

use crate::api::envelope::{paginated, success, PaginatedBody, SuccessBody};
use crate::api::error::ApiError;
use crate::api::params::{ExecutionQuery, IdeaQuery, ValidJson, ValidQuery};
use crate::core::AppContext;
use crate::services::testing::{NewTestIdea, TestExecution, TestIdea};

/// Ideas page with the overall testing statistics alongside
pub async fn ideas(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<IdeaQuery>,
) -> Result<PaginatedBody<TestIdea>, ApiError> {
    let testing = context.testing();
    let result = testing.ideas(&query.filter(), query.page()?).await;
    let stats = testing.stats().await;
    Ok(paginated(result).with_extra("stats", json!(stats)))
}

pub async fn create_idea(
    State(context): State<AppContext>,
    ValidJson(new): ValidJson<NewTestIdea>,
) -> Result<(StatusCode, SuccessBody<TestIdea>), ApiError> {
    let idea = context.testing().create_idea(new).await?;
    Ok((StatusCode::CREATED, success(idea).with_message("Test idea created")))
}

pub async fn idea(
    State(context): State<AppContext>,
    Path(id): Path<String>,
) -> Result<SuccessBody<TestIdea>, ApiError> {
    context
        .testing()
        .idea(&id)
        .await
        .map(success)
        .ok_or_else(|| ApiError::not_found("Test idea not found"))
}

pub async fn active(State(context): State<AppContext>) -> SuccessBody<Vec<TestExecution>> {
    success(context.testing().active_tests().await)
}

pub async fn executions(
    State(context): State<AppContext>,
    ValidQuery(query): ValidQuery<ExecutionQuery>,
) -> SuccessBody<Vec<TestExecution>> {
    success(context.testing().executions(&query.filter()).await)
}
