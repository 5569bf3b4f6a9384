//! Report submission validation
//!
//! Validation never fails: every check returns a [`ValidationResult`] whose
//! `errors` map is keyed by request field name. A field with no entry is
//! valid. Each deployment variant has its own rule set; the two are never
//! combined.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{list_names, Market, Month, Product, Unit};
use crate::models::DeploymentVariant;

/// Prices above this are rejected as unrealistic
pub const PRICE_CEILING: f64 = 1_000_000.0;

/// Free-text length bounds (store variant), in characters after trimming
pub const PRODUCT_NAME_LEN: (usize, usize) = (2, 100);
pub const STORE_NAME_LEN: (usize, usize) = (2, 200);
pub const AREA_LEN: (usize, usize) = (2, 100);

/// Field name → human-readable message
pub type FieldErrors = BTreeMap<String, String>;

/// Verdict returned by every validator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: FieldErrors,
}

impl ValidationResult {
    fn from_errors(errors: FieldErrors) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Raw report submission as received from a client
///
/// All fields are optional so that a malformed body still reaches
/// validation and produces field-level messages.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportInput {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub market_name: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub store_name: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
}

/// Validated market-variant submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketSubmission {
    pub product: Product,
    pub price: f64,
    pub unit: Unit,
    pub market: Market,
    pub month: Month,
}

/// Validated store-variant submission (strings already sanitised)
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSubmission {
    pub product_name: String,
    pub price: f64,
    pub unit: Unit,
    pub store_name: String,
    pub area: String,
}

/// Validated submission, tagged by deployment variant
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Market(MarketSubmission),
    Store(StoreSubmission),
}

/// Validate a submission against the rules of `variant`
pub fn validate_report_input(variant: DeploymentVariant, input: &ReportInput) -> ValidationResult {
    match variant {
        DeploymentVariant::Market => validate_market_input(input),
        DeploymentVariant::Store => validate_store_input(input),
    }
}

/// Market-variant rules: closed product, unit, market and month lists
pub fn validate_market_input(input: &ReportInput) -> ValidationResult {
    let mut errors = FieldErrors::new();

    if input.product_name.as_deref().and_then(Product::parse).is_none() {
        errors.insert(
            "productName".into(),
            format!(
                "Invalid product. Must be one of: {}",
                list_names(&Product::ALL, Product::as_str)
            ),
        );
    }

    check_price(input.price, &mut errors);

    let unit_ok = input
        .unit
        .as_deref()
        .and_then(Unit::parse)
        .is_some_and(|u| Unit::MARKET.contains(&u));
    if !unit_ok {
        errors.insert(
            "unit".into(),
            format!(
                "Invalid unit. Must be one of: {}",
                list_names(&Unit::MARKET, Unit::as_str)
            ),
        );
    }

    if input.market_name.as_deref().and_then(Market::parse).is_none() {
        errors.insert(
            "marketName".into(),
            format!(
                "Invalid market. Must be one of: {}",
                list_names(&Market::ALL, Market::as_str)
            ),
        );
    }

    if input.month.as_deref().and_then(Month::parse).is_none() {
        errors.insert(
            "month".into(),
            "Invalid month. Must be a valid month name".into(),
        );
    }

    ValidationResult::from_errors(errors)
}

/// Store-variant rules: bounded free text, six units, no whitelists
pub fn validate_store_input(input: &ReportInput) -> ValidationResult {
    let mut errors = FieldErrors::new();

    check_text(
        "productName",
        "Product name",
        input.product_name.as_deref(),
        PRODUCT_NAME_LEN,
        &mut errors,
    );

    check_price(input.price, &mut errors);

    if input.unit.as_deref().and_then(Unit::parse).is_none() {
        errors.insert(
            "unit".into(),
            format!(
                "Invalid unit. Must be one of: {}",
                list_names(&Unit::ALL, Unit::as_str)
            ),
        );
    }

    check_text(
        "storeName",
        "Store name",
        input.store_name.as_deref(),
        STORE_NAME_LEN,
        &mut errors,
    );
    check_text("area", "Area", input.area.as_deref(), AREA_LEN, &mut errors);

    ValidationResult::from_errors(errors)
}

impl ReportInput {
    /// Validate and convert into a typed submission
    pub fn into_submission(self, variant: DeploymentVariant) -> Result<Submission, FieldErrors> {
        let verdict = validate_report_input(variant, &self);
        if !verdict.is_valid {
            return Err(verdict.errors);
        }

        // Every field below was checked by the validator above.
        let missing = || {
            let mut errors = FieldErrors::new();
            errors.insert("request".into(), "Incomplete submission".into());
            errors
        };
        let price = self.price.ok_or_else(missing)?;
        let unit = self.unit.as_deref().and_then(Unit::parse).ok_or_else(missing)?;

        match variant {
            DeploymentVariant::Market => Ok(Submission::Market(MarketSubmission {
                product: self
                    .product_name
                    .as_deref()
                    .and_then(Product::parse)
                    .ok_or_else(missing)?,
                price,
                unit,
                market: self
                    .market_name
                    .as_deref()
                    .and_then(Market::parse)
                    .ok_or_else(missing)?,
                month: self.month.as_deref().and_then(Month::parse).ok_or_else(missing)?,
            })),
            DeploymentVariant::Store => Ok(Submission::Store(StoreSubmission {
                product_name: sanitize_input(self.product_name.as_deref().unwrap_or_default()),
                price,
                unit,
                store_name: sanitize_input(self.store_name.as_deref().unwrap_or_default()),
                area: sanitize_input(self.area.as_deref().unwrap_or_default()),
            })),
        }
    }
}

/// Trim and strip angle brackets from free text
pub fn sanitize_input(input: &str) -> String {
    input.trim().replace(['<', '>'], "")
}

fn check_price(price: Option<f64>, errors: &mut FieldErrors) {
    match price {
        Some(p) if p.is_finite() && p > 0.0 => {
            if p > PRICE_CEILING {
                errors.insert("price".into(), "Price seems unrealistic".into());
            }
        }
        _ => {
            errors.insert("price".into(), "Price must be a positive number".into());
        }
    }
}

fn check_text(
    field: &str,
    label: &str,
    value: Option<&str>,
    (min, max): (usize, usize),
    errors: &mut FieldErrors,
) {
    let len = value.map(|v| v.trim().chars().count()).unwrap_or(0);
    if len < min || len > max {
        errors.insert(
            field.into(),
            format!("{} must be between {} and {} characters", label, min, max),
        );
    }
}

/// Accept a price as a JSON number or numeric string; anything else is absent
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Other(serde_json::Value),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse::<f64>().ok(),
        Some(Raw::Other(_)) | None => None,
    })
}
