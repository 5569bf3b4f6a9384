//! Liveness endpoint

use axum::{extract::State, routing::get, Json, Router};
use fairprice_common::DeploymentVariant;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    /// Submission schema this deployment accepts
    pub variant: DeploymentVariant,
    /// Whether submissions can be scored right now
    pub oracle_configured: bool,
}

/// GET /health (public)
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        module: "fairprice-server",
        version: env!("CARGO_PKG_VERSION"),
        variant: state.variant,
        oracle_configured: state.oracle.is_some(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
