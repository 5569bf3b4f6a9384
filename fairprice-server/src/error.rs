//! Error types for fairprice-server
//!
//! Every handler failure becomes the standard envelope with
//! `success: false`. Internal detail is logged, never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fairprice_common::api::ApiResponse;
use fairprice_common::validation::FieldErrors;
use thiserror::Error;
use tracing::{error, warn};

use crate::services::oracle_client::OracleError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Field-level validation failure (400)
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or invalid caller identity (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller identified but lacks the role (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found, or not owned by the caller (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Caller account does not exist yet (404, tells the client to onboard)
    #[error("User not found")]
    NeedsOnboarding,

    /// Conflict (409), e.g. report already reviewed
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Price oracle failed or timed out (502)
    #[error("Price analysis failed: {0}")]
    Upstream(#[from] OracleError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// fairprice-common error (500)
    #[error("Common error: {0}")]
    Common(#[from] fairprice_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, "Validation failed".to_string(), Some(errors))
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::NeedsOnboarding => {
                let body = Json(serde_json::json!({
                    "success": false,
                    "message": "User not found",
                    "needsOnboarding": true,
                }));
                return (StatusCode::NOT_FOUND, body).into_response();
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::Upstream(ref err) => {
                warn!("Price oracle call failed: {}", err);
                (
                    StatusCode::BAD_GATEWAY,
                    "Price analysis service unavailable".to_string(),
                    None,
                )
            }
            ApiError::Internal(ref msg) => {
                error!("Internal error: {}", msg);
                internal()
            }
            ApiError::Common(ref err) => {
                error!("Common error: {}", err);
                internal()
            }
        };

        (status, Json(ApiResponse::failure(message, errors))).into_response()
    }
}

fn internal() -> (StatusCode, String, Option<FieldErrors>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
        None,
    )
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_carries_field_errors() {
        let mut errors = FieldErrors::new();
        errors.insert("price".into(), "Price must be a positive number".into());
        let response = ApiError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"]["price"], "Price must be a positive number");
    }

    #[tokio::test]
    async fn test_internal_errors_do_not_leak_detail() {
        let response = ApiError::Internal("pool exhausted at db.rs:42".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_upstream_error_is_generic_bad_gateway() {
        let response = ApiError::Upstream(OracleError::Timeout).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Price analysis service unavailable");
    }

    #[tokio::test]
    async fn test_auth_errors_are_distinct() {
        let unauthorized = ApiError::Unauthorized("No authentication token provided".into()).into_response();
        let forbidden = ApiError::Forbidden("Access denied".into()).into_response();
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_needs_onboarding_flag() {
        let response = ApiError::NeedsOnboarding.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["needsOnboarding"], true);
    }
}
