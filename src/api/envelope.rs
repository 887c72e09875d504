//! JSON response envelopes
//!
//! Every response carries an RFC 3339 `timestamp`. Successful responses also
//! carry `success: true`, and paginated ones add a `pagination` block.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use store_object::PaginatedResult;

pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Serialize)]
pub struct SuccessBody<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T: Serialize> SuccessBody<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
            timestamp: timestamp(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> IntoResponse for SuccessBody<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `{ success, data }` with status 200
pub fn success<T: Serialize>(data: T) -> SuccessBody<T> {
    SuccessBody::new(data)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct PaginatedBody<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: PageMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
    /// Extra top-level members, e.g. aggregate statistics next to the page
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<T: Serialize> PaginatedBody<T> {
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }
}

impl<T> From<PaginatedResult<T>> for PaginatedBody<T> {
    fn from(result: PaginatedResult<T>) -> Self {
        Self {
            success: true,
            pagination: PageMeta {
                page: result.page,
                page_size: result.page_size,
                total: result.total,
                total_pages: result.total_pages,
            },
            data: result.data,
            message: None,
            timestamp: timestamp(),
            extra: Map::new(),
        }
    }
}

impl<T: Serialize> IntoResponse for PaginatedBody<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

pub fn paginated<T: Serialize>(result: PaginatedResult<T>) -> PaginatedBody<T> {
    PaginatedBody::from(result)
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub timestamp: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: Some(code.to_string()),
            details: None,
            timestamp: timestamp(),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use store_object::PageRequest;

    #[test]
    fn test_success_envelope_shape() {
        let body = serde_json::to_value(success(vec![1, 2]).with_message("ok")).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], json!([1, 2]));
        assert_eq!(body["message"], "ok");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));

        let bare = serde_json::to_value(success(1)).unwrap();
        assert!(bare.get("message").is_none());
    }

    #[test]
    fn test_paginated_envelope_flattens_extra() {
        let result = PaginatedResult::from_slice(&[1, 2, 3], PageRequest::new(2, 2).unwrap());
        let body = paginated(result).with_extra("statistics", json!({"regions": 5}));
        let body = serde_json::to_value(body).unwrap();

        assert_eq!(body["data"], json!([3]));
        assert_eq!(
            body["pagination"],
            json!({"page": 2, "pageSize": 2, "total": 3, "totalPages": 2})
        );
        assert_eq!(body["statistics"]["regions"], 5);
    }

    #[test]
    fn test_error_body_omits_empty_fields() {
        let body = serde_json::to_value(ErrorBody::new("gone", "NOT_FOUND")).unwrap();
        assert_eq!(body["code"], "NOT_FOUND");
        assert!(body.get("details").is_none());
    }
}
