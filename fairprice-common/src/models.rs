//! Report and user entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::catalog::{Market, Month, Unit};
use crate::Error;

/// Which schema a deployment accepts
///
/// The two schemas are alternate configurations, never mixed in one
/// deployment's validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentVariant {
    /// Fixed markets and months, every report scored by the price oracle
    #[default]
    Market,
    /// Free-text store and area, manual verification only
    Store,
}

impl DeploymentVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentVariant::Market => "market",
            DeploymentVariant::Store => "store",
        }
    }
}

impl FromStr for DeploymentVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "market" => Ok(DeploymentVariant::Market),
            "store" => Ok(DeploymentVariant::Store),
            other => Err(Error::Config(format!(
                "unknown deployment variant '{}' (expected 'market' or 'store')",
                other
            ))),
        }
    }
}

/// Report review status
///
/// Starts at `Pending` and moves once to `Verified` or `Flagged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Verified,
    Flagged,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Verified => "verified",
            ReportStatus::Flagged => "flagged",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReportStatus::Pending),
            "verified" => Some(ReportStatus::Verified),
            "flagged" => Some(ReportStatus::Flagged),
            _ => None,
        }
    }

    /// Whether a verification action may move a report into this status
    pub fn is_review_outcome(self) -> bool {
        matches!(self, ReportStatus::Verified | ReportStatus::Flagged)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a report's price was checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMethod {
    Manual,
    Ml,
}

impl VerificationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationMethod::Manual => "manual",
            VerificationMethod::Ml => "ml",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(VerificationMethod::Manual),
            "ml" => Some(VerificationMethod::Ml),
            _ => None,
        }
    }
}

/// Price oracle verdict stored with a market-variant report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlAnalysis {
    /// Predicted wholesale (mandi) benchmark price
    pub mandi_benchmark: f64,
    /// Predicted fair retail price
    pub expected_price: f64,
    /// Oracle's own deviation label, e.g. "25.0%"
    pub deviation: String,
    pub anomaly: bool,
    pub reason: String,
}

/// Where a price was observed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum ReportLocation {
    Market {
        #[serde(rename = "marketName")]
        market: Market,
        month: Month,
    },
    Store {
        #[serde(rename = "storeName")]
        store_name: String,
        area: String,
    },
}

impl ReportLocation {
    pub fn variant(&self) -> DeploymentVariant {
        match self {
            ReportLocation::Market { .. } => DeploymentVariant::Market,
            ReportLocation::Store { .. } => DeploymentVariant::Store,
        }
    }

    /// Area used by trend filters and change alerts
    ///
    /// A market-variant report's area is its market name.
    pub fn area(&self) -> &str {
        match self {
            ReportLocation::Market { market, .. } => market.as_str(),
            ReportLocation::Store { area, .. } => area,
        }
    }
}

/// One user-submitted price observation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub user_id: String,
    pub product_name: String,
    pub price: f64,
    pub unit: Unit,
    #[serde(flatten)]
    pub location: ReportLocation,
    pub verification_method: VerificationMethod,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml_analysis: Option<MlAnalysis>,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    /// New market-variant report carrying the oracle's analysis
    #[allow(clippy::too_many_arguments)]
    pub fn scored(
        user_id: String,
        product_name: String,
        price: f64,
        unit: Unit,
        market: Market,
        month: Month,
        analysis: MlAnalysis,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            product_name,
            price,
            unit,
            location: ReportLocation::Market { market, month },
            verification_method: VerificationMethod::Ml,
            status: ReportStatus::Pending,
            ml_analysis: Some(analysis),
            verified_by: None,
            verified_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// New store-variant report awaiting manual review
    pub fn manual(
        user_id: String,
        product_name: String,
        price: f64,
        unit: Unit,
        store_name: String,
        area: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            product_name,
            price,
            unit,
            location: ReportLocation::Store { store_name, area },
            verification_method: VerificationMethod::Manual,
            status: ReportStatus::Pending,
            ml_analysis: None,
            verified_by: None,
            verified_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Predicted price from the oracle, if scored
    pub fn expected_price(&self) -> Option<f64> {
        self.ml_analysis.as_ref().map(|a| a.expected_price)
    }

    pub fn area(&self) -> &str {
        self.location.area()
    }
}

/// Account roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Verifier,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Verifier => "verifier",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "verifier" => Some(Role::Verifier),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Roles other than `User` need the admin code at onboarding
    pub fn is_privileged(self) -> bool {
        !matches!(self, Role::User)
    }
}

/// Account linked to one external identity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub identity_id: String,
    pub role: Role,
    pub onboarding_complete: bool,
    pub created_at: DateTime<Utc>,
}

/// Accept either a JSON string or a number and keep it as text
///
/// The oracle reports deviation as a label such as `"25.0%"`; older builds
/// sent a bare number.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
