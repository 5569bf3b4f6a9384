//! HTTP API handlers for fairprice-server

pub mod auth;
pub mod health;
pub mod markets;
pub mod products;
pub mod reports;
pub mod stats;
pub mod trends;
pub mod users;

pub use auth::{Authorized, CallerIdentity, IsAdmin, IsUser, IsVerifier};
pub use health::health_routes;
pub use markets::map_view;
pub use products::{product_markets, product_trend};
pub use reports::{all_reports, create_report, delete_report, my_reports, recent_reports, verify_report};
pub use stats::my_stats;
pub use trends::{alerts, product_trends};
pub use users::{current_user, onboard};

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::{ApiError, ApiResult};

/// Unwrap a JSON body, turning axum's plain-text rejection into the envelope
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text())))
}
