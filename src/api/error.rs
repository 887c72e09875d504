//! HTTP error mapping

use super::envelope::ErrorBody;
use crate::errors::PulseboardError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{json, Value};
use store_object::StoreError;
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
    code: String,
}

fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Validation failed for field '{field}'")),
                code: e.code.to_string(),
            })
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

impl ApiError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::NotFound(what.into())
    }

    /// A 400 for a single invalid parameter
    pub fn invalid_param(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        ApiError::Validation {
            details: json!({ "errors": [{ "field": field, "message": message, "code": "invalid" }] }),
            message: "Invalid query parameters".to_string(),
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "INVALID_BODY"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Store(e) => match e {
                StoreError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "DB_NOT_FOUND"),
                StoreError::Busy(_) => (StatusCode::SERVICE_UNAVAILABLE, "DB_BUSY"),
                StoreError::Timeout(_) => (StatusCode::SERVICE_UNAVAILABLE, "DB_TIMEOUT"),
                StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                StoreError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!(code, error = %self, "request failed");
        } else {
            warn!(code, error = %self, "request rejected");
        }

        let message = match &self {
            ApiError::Store(StoreError::Unavailable(_)) => "Database not found".to_string(),
            ApiError::Store(StoreError::Busy(_)) => "Database is busy".to_string(),
            other => other.to_string(),
        };
        let body = ErrorBody::new(message, code);
        let body = match self {
            ApiError::Validation { details, .. } => body.with_details(details),
            _ => body,
        };
        body.into_response_with(status)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation {
            message: "Validation failed".to_string(),
            details: json!({ "errors": field_errors(&errors) }),
        }
    }
}

impl From<PulseboardError> for ApiError {
    fn from(error: PulseboardError) -> Self {
        match error {
            PulseboardError::Validation(errors) => errors.into(),
            PulseboardError::Store(e) => ApiError::Store(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation {
            message: "Invalid query parameters".to_string(),
            details: json!({ "query": rejection.body_text() }),
        }
    }
}
