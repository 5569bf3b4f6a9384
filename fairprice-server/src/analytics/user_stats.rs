//! Per-user report statistics

use chrono::{DateTime, Utc};
use fairprice_common::time::days_before;
use fairprice_common::ReportStatus;
use serde::Serialize;
use std::collections::HashMap;

use super::{mean, round_to};

/// Trailing window counted as recent activity
pub const RECENT_WINDOW_DAYS: i64 = 7;
/// Number of products listed in `topProducts`
pub const TOP_PRODUCTS: usize = 5;

/// The fields of one report that user statistics need
#[derive(Debug, Clone, PartialEq)]
pub struct UserReportFact {
    pub status: ReportStatus,
    pub product_name: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductActivity {
    pub name: String,
    pub count: i64,
    pub avg_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_reports: i64,
    pub verified_reports: i64,
    pub pending_reports: i64,
    pub flagged_reports: i64,
    /// Reports created within the last [`RECENT_WINDOW_DAYS`] days
    pub recent_activity: i64,
    pub top_products: Vec<ProductActivity>,
}

/// Aggregate one user's reports
///
/// The status counts always sum to `total_reports`. Top products are
/// ordered by report count, ties by product name.
pub fn compute_user_stats(facts: &[UserReportFact], now: DateTime<Utc>) -> UserStats {
    let recent_cutoff = days_before(now, RECENT_WINDOW_DAYS);

    let mut verified = 0;
    let mut pending = 0;
    let mut flagged = 0;
    let mut recent = 0;
    let mut prices_by_product: HashMap<&str, Vec<f64>> = HashMap::new();

    for fact in facts {
        match fact.status {
            ReportStatus::Verified => verified += 1,
            ReportStatus::Pending => pending += 1,
            ReportStatus::Flagged => flagged += 1,
        }
        if fact.created_at >= recent_cutoff {
            recent += 1;
        }
        prices_by_product
            .entry(fact.product_name.as_str())
            .or_default()
            .push(fact.price);
    }

    let mut top_products: Vec<ProductActivity> = prices_by_product
        .into_iter()
        .map(|(name, prices)| ProductActivity {
            name: name.to_string(),
            count: prices.len() as i64,
            avg_price: mean(&prices).map(|m| round_to(m, 2)).unwrap_or(0.0),
        })
        .collect();
    top_products.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    top_products.truncate(TOP_PRODUCTS);

    UserStats {
        total_reports: facts.len() as i64,
        verified_reports: verified,
        pending_reports: pending,
        flagged_reports: flagged,
        recent_activity: recent,
        top_products,
    }
}
