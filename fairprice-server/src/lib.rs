//! fairprice-server library
//!
//! HTTP service for crowdsourced commodity price reports: submission with
//! ML scoring, review by verifiers, and dashboard aggregates.

use axum::{
    http::Method,
    routing::{delete, get, patch, post},
    Router,
};
use fairprice_common::config::ServiceConfig;
use fairprice_common::DeploymentVariant;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod analytics;
pub mod api;
pub mod cli;
pub mod db;
pub mod error;
pub mod identity;
pub mod services;

pub use error::{ApiError, ApiResult};

use identity::{IdentityVerifier, JwtIdentityVerifier};
use services::{HttpPriceOracle, OracleError, PriceOracle};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Which submission schema this deployment accepts
    pub variant: DeploymentVariant,
    /// Code required for verifier/admin onboarding; `None` disables it
    pub admin_code: Option<String>,
    /// Bearer token verifier
    pub identity: Arc<dyn IdentityVerifier>,
    /// Price oracle; present whenever the variant is `Market`
    pub oracle: Option<Arc<dyn PriceOracle>>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        variant: DeploymentVariant,
        admin_code: Option<String>,
        identity: Arc<dyn IdentityVerifier>,
        oracle: Option<Arc<dyn PriceOracle>>,
    ) -> Self {
        Self {
            db,
            variant,
            admin_code,
            identity,
            oracle,
        }
    }

    /// Wire up the real collaborators from resolved configuration
    pub fn from_config(db: SqlitePool, config: &ServiceConfig) -> Result<Self, OracleError> {
        let identity: Arc<dyn IdentityVerifier> = Arc::new(JwtIdentityVerifier::new(
            &config.token_secret,
            config.token_issuer.clone(),
        ));

        let oracle: Option<Arc<dyn PriceOracle>> = match (&config.variant, &config.ml_url) {
            (DeploymentVariant::Market, Some(url)) => {
                Some(Arc::new(HttpPriceOracle::new(url, config.ml_timeout)?))
            }
            _ => None,
        };

        Ok(Self::new(
            db,
            config.variant,
            config.admin_code.clone(),
            identity,
            oracle,
        ))
    }
}

/// Build application router
///
/// Access is decided per handler by its extractors: `Authorized<IsUser>`,
/// `Authorized<IsVerifier>`, a bare `CallerIdentity`, or nothing (public).
pub fn build_router(state: AppState) -> Router {
    let reports = Router::new()
        .route("/reports/create", post(api::create_report))
        .route("/reports/my-reports", get(api::my_reports))
        .route("/reports/recent", get(api::recent_reports))
        .route("/reports/all", get(api::all_reports))
        .route("/reports/verify/:id", patch(api::verify_report))
        .route("/reports/:id", delete(api::delete_report));

    let analytics = Router::new()
        .route("/stats/me", get(api::my_stats))
        .route("/trends/alerts", get(api::alerts))
        .route("/trends/product", get(api::product_trends))
        .route("/markets/map-view", get(api::map_view))
        .route("/products/:name/markets", get(api::product_markets))
        .route("/products/:name/trend", get(api::product_trend));

    let users = Router::new()
        .route("/users/onboard", post(api::onboard))
        .route("/users/me", get(api::current_user));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .merge(reports)
        .merge(analytics)
        .merge(users)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
