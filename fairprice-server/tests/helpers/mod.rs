//! Shared setup for fairprice-server integration tests
//!
//! Each test gets its own in-memory database, a token signer matching the
//! server's verifier, and a stub oracle whose answers the test controls.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Duration;
use fairprice_common::catalog::{Market, Month, Unit};
use fairprice_common::db::create_schema;
use fairprice_common::models::MlAnalysis;
use fairprice_common::{time, DeploymentVariant, Report, Role, User};
use fairprice_server::db::{reports, users};
use fairprice_server::identity::JwtIdentityVerifier;
use fairprice_server::services::{OracleError, OracleRequest, OracleResponse, PriceOracle};
use fairprice_server::{build_router, AppState};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

pub const TOKEN_SECRET: &str = "integration-test-secret";
pub const ADMIN_CODE: &str = "open-sesame";

/// Oracle stand-in: predicts a fixed price, or fails on demand
pub struct StubOracle {
    pub expected_price: Mutex<f64>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl StubOracle {
    pub fn predicting(expected_price: f64) -> Self {
        Self {
            expected_price: Mutex::new(expected_price),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceOracle for StubOracle {
    async fn check_price(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(OracleError::Status(503, "model not loaded".to_string()));
        }

        let expected = *self.expected_price.lock().unwrap();
        let deviation = (request.actual_price - expected) / expected * 100.0;
        Ok(OracleResponse {
            mandi_benchmark: expected * 0.7,
            expected_price: expected,
            deviation: format!("{:.1}%", deviation),
            is_anomaly: deviation.abs() > 15.0,
            reason: if deviation.abs() > 15.0 {
                "Potential Market Hoarding".to_string()
            } else {
                "Fair Price".to_string()
            },
        })
    }
}

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub oracle: Arc<StubOracle>,
    signer: JwtIdentityVerifier,
}

pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    create_schema(&pool).await.expect("schema");
    pool
}

impl TestApp {
    /// Market deployment, oracle predicting 32.0, admin code configured
    pub async fn market() -> Self {
        Self::build(DeploymentVariant::Market, Some(ADMIN_CODE)).await
    }

    /// Store deployment (no oracle), admin code configured
    pub async fn store() -> Self {
        Self::build(DeploymentVariant::Store, Some(ADMIN_CODE)).await
    }

    pub async fn build(variant: DeploymentVariant, admin_code: Option<&str>) -> Self {
        let pool = memory_pool().await;
        let oracle = Arc::new(StubOracle::predicting(32.0));
        let server_oracle: Option<Arc<dyn PriceOracle>> = match variant {
            DeploymentVariant::Market => Some(oracle.clone()),
            DeploymentVariant::Store => None,
        };

        let state = AppState::new(
            pool.clone(),
            variant,
            admin_code.map(str::to_string),
            Arc::new(JwtIdentityVerifier::new(TOKEN_SECRET, None)),
            server_oracle,
        );

        Self {
            app: build_router(state),
            pool,
            oracle,
            signer: JwtIdentityVerifier::new(TOKEN_SECRET, None),
        }
    }

    /// Bearer token for `identity`
    pub fn token(&self, identity: &str) -> String {
        self.signer.issue(identity, Duration::minutes(10)).unwrap()
    }

    /// Create an account directly and return a token for it
    pub async fn account(&self, identity: &str, role: Role) -> String {
        let user = User {
            identity_id: identity.to_string(),
            role,
            onboarding_complete: true,
            created_at: time::now(),
        };
        assert!(users::insert_user(&self.pool, &user).await.unwrap());
        self.token(identity)
    }

    pub async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let body = body.map(|json| json.to_string());
        self.send_raw(method, uri, token, body.as_deref()).await
    }

    pub async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(text) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(text.to_string())
            }
            None => Body::empty(),
        };

        let response = self.app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Should parse JSON")
        };
        (status, json)
    }

    pub async fn report_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM reports")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    /// Store a scored market report directly, bypassing the oracle
    pub async fn seed_scored(
        &self,
        user: &str,
        product: &str,
        market: Market,
        month: Month,
        price: f64,
        expected_price: f64,
        age: Duration,
    ) -> Report {
        let report = Report::scored(
            user.to_string(),
            product.to_string(),
            price,
            Unit::Kg,
            market,
            month,
            MlAnalysis {
                mandi_benchmark: expected_price * 0.7,
                expected_price,
                deviation: "0.0%".to_string(),
                anomaly: false,
                reason: "Fair Price".to_string(),
            },
            time::now() - age,
        );
        reports::insert_report(&self.pool, &report).await.unwrap();
        report
    }

    /// Store a scored report and mark it verified
    pub async fn seed_verified(&self, product: &str, market: Market, price: f64, age: Duration) -> Report {
        let report = self
            .seed_scored("seed_user", product, market, Month::June, price, price, age)
            .await;
        reports::set_review_outcome(
            &self.pool,
            report.id,
            fairprice_common::ReportStatus::Verified,
            "seed_verifier",
            time::now(),
        )
        .await
        .unwrap();
        report
    }
}

/// Valid market-variant submission body
pub fn onion_submission(price: f64) -> Value {
    serde_json::json!({
        "productName": "Onion",
        "price": price,
        "unit": "kg",
        "marketName": "Azadpur",
        "month": "June"
    })
}
