//! Report ingestion
//!
//! `received → validated → scored → persisted`. Every step either succeeds
//! or ends the request with nothing written: the oracle is consulted before
//! any write, and the report and its ML analysis go into the store in a
//! single INSERT.

use chrono::{DateTime, Utc};
use fairprice_common::validation::{FieldErrors, MarketSubmission, ReportInput, StoreSubmission, Submission};
use fairprice_common::{DeploymentVariant, Report};
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::reports::insert_report;
use crate::error::ApiError;
use crate::services::oracle_client::{OracleError, OracleRequest, PriceOracle};

/// Ingestion failures, one per step
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Validation failed")]
    Invalid(FieldErrors),

    #[error("No price oracle configured for the market variant")]
    OracleNotConfigured,

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("Storage failed: {0}")]
    Storage(#[from] fairprice_common::Error),
}

impl From<IngestionError> for ApiError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::Invalid(errors) => ApiError::Validation(errors),
            IngestionError::OracleNotConfigured => ApiError::Internal(err.to_string()),
            IngestionError::Oracle(e) => ApiError::Upstream(e),
            IngestionError::Storage(e) => ApiError::Common(e),
        }
    }
}

/// What the caller gets back from a successful submission
///
/// Scored reports return only the id and predicted price; the stored
/// deviation fields are only visible through later reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CreatedReport {
    #[serde(rename_all = "camelCase")]
    Scored { id: Uuid, predicted_price: f64 },
    Manual(Box<Report>),
}

/// Validate, score (market variant) and persist one submission
pub async fn ingest_report(
    pool: &SqlitePool,
    variant: DeploymentVariant,
    oracle: Option<&dyn PriceOracle>,
    user_id: &str,
    input: ReportInput,
    now: DateTime<Utc>,
) -> Result<CreatedReport, IngestionError> {
    let submission = input.into_submission(variant).map_err(|errors| {
        debug!(user_id, fields = ?errors.keys().collect::<Vec<_>>(), "Report rejected by validation");
        IngestionError::Invalid(errors)
    })?;

    match submission {
        Submission::Market(market) => {
            let oracle = oracle.ok_or(IngestionError::OracleNotConfigured)?;
            ingest_scored(pool, oracle, user_id, market, now).await
        }
        Submission::Store(store) => ingest_manual(pool, user_id, store, now).await,
    }
}

async fn ingest_scored(
    pool: &SqlitePool,
    oracle: &dyn PriceOracle,
    user_id: &str,
    submission: MarketSubmission,
    now: DateTime<Utc>,
) -> Result<CreatedReport, IngestionError> {
    let request = OracleRequest {
        month: submission.month.ordinal(),
        commodity_name: submission.product.as_str().to_string(),
        market_name: submission.market.as_str().to_string(),
        actual_price: submission.price,
    };
    let scored = oracle.check_price(&request).await?;
    let predicted_price = scored.expected_price;

    let report = Report::scored(
        user_id.to_string(),
        submission.product.as_str().to_string(),
        submission.price,
        submission.unit,
        submission.market,
        submission.month,
        scored.into(),
        now,
    );
    insert_report(pool, &report).await?;

    info!(
        report_id = %report.id,
        product = %submission.product,
        market = %submission.market,
        "Scored report stored"
    );
    Ok(CreatedReport::Scored {
        id: report.id,
        predicted_price,
    })
}

async fn ingest_manual(
    pool: &SqlitePool,
    user_id: &str,
    submission: StoreSubmission,
    now: DateTime<Utc>,
) -> Result<CreatedReport, IngestionError> {
    let report = Report::manual(
        user_id.to_string(),
        submission.product_name,
        submission.price,
        submission.unit,
        submission.store_name,
        submission.area,
        now,
    );
    insert_report(pool, &report).await?;

    info!(report_id = %report.id, "Report stored for manual review");
    Ok(CreatedReport::Manual(Box::new(report)))
}
