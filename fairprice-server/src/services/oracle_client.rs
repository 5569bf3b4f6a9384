//! Price oracle client
//!
//! The oracle is an external scoring service. Given the reporting month,
//! commodity, market and observed price it predicts a fair retail price
//! and says whether the observation looks anomalous. Its internals are not
//! our concern; this module only speaks the wire contract:
//!
//! `POST {base}/api/v1/check-price`
//! `{month, commodity_name, market_name, actual_price}` →
//! `{mandi_benchmark, expected_price, deviation, is_anomaly, reason}`
//!
//! Every call is bounded by the configured timeout. There are no retries.

use async_trait::async_trait;
use fairprice_common::models::{string_or_number, MlAnalysis};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const CHECK_PRICE_PATH: &str = "/api/v1/check-price";
const USER_AGENT: &str = concat!("fairprice-server/", env!("CARGO_PKG_VERSION"));

/// Oracle client errors
#[derive(Debug, Error)]
pub enum OracleError {
    /// No response within the configured timeout
    #[error("Oracle request timed out")]
    Timeout,

    /// Connection or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Oracle answered with a non-success status
    #[error("Oracle returned {0}: {1}")]
    Status(u16, String),

    /// Response body did not match the contract
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OracleError::Timeout
        } else if err.is_decode() {
            OracleError::Parse(err.to_string())
        } else {
            OracleError::Network(err.to_string())
        }
    }
}

/// Scoring request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleRequest {
    /// 1-based month number
    pub month: u32,
    pub commodity_name: String,
    pub market_name: String,
    pub actual_price: f64,
}

/// Scoring response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleResponse {
    pub mandi_benchmark: f64,
    pub expected_price: f64,
    #[serde(deserialize_with = "string_or_number")]
    pub deviation: String,
    pub is_anomaly: bool,
    pub reason: String,
}

impl From<OracleResponse> for MlAnalysis {
    fn from(r: OracleResponse) -> Self {
        MlAnalysis {
            mandi_benchmark: r.mandi_benchmark,
            expected_price: r.expected_price,
            deviation: r.deviation,
            anomaly: r.is_anomaly,
            reason: r.reason,
        }
    }
}

/// Anything that can score a price observation
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn check_price(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError>;
}

/// HTTP oracle client
pub struct HttpPriceOracle {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpPriceOracle {
    /// `base_url` without trailing slash, e.g. `http://127.0.0.1:8000`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, OracleError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), CHECK_PRICE_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PriceOracle for HttpPriceOracle {
    async fn check_price(&self, request: &OracleRequest) -> Result<OracleResponse, OracleError> {
        tracing::debug!(
            commodity = %request.commodity_name,
            market = %request.market_name,
            month = request.month,
            "Querying price oracle"
        );

        let response = self.http_client.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(OracleError::Status(status.as_u16(), error_text));
        }

        let body = response.bytes().await?;
        let scored: OracleResponse =
            serde_json::from_slice(&body).map_err(|e| OracleError::Parse(e.to_string()))?;

        if !scored.expected_price.is_finite() || !scored.mandi_benchmark.is_finite() {
            return Err(OracleError::Parse("non-finite price in oracle response".to_string()));
        }

        tracing::info!(
            commodity = %request.commodity_name,
            market = %request.market_name,
            expected_price = scored.expected_price,
            anomaly = scored.is_anomaly,
            "Price oracle scored report"
        );

        Ok(scored)
    }
}
