//! Errors surfaced at the HTTP boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde_json::json;
use thiserror::Error;

/// Message returned for any storage failure; the cause stays in the logs.
const INTERNAL_ERROR_MESSAGE: &str = "サーバーエラーが発生しました";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Input violated a declared field rule.
    #[error("{0}")]
    Validation(String),

    /// A path parameter could not be parsed.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// The database rejected or failed an operation.
    #[error("storage failure: {0:#}")]
    Storage(anyhow::Error),
}

impl ApiError {
    /// - Validation: 422 Unprocessable Entity
    /// - BadRequest: 400 Bad Request
    /// - NotFound: 404 Not Found
    /// - Storage: 500 Internal Server Error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            Self::Validation(message) | Self::BadRequest(message) | Self::NotFound(message) => {
                message
            }
            Self::Storage(err) => {
                error!("Storage failure: {err:#}");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_storage_errors_do_not_leak_details() {
        let response = ApiError::from(anyhow!("secret database path")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("secret"));
        assert!(text.contains(INTERNAL_ERROR_MESSAGE));
    }
}
