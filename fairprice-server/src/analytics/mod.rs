//! Analytics engine
//!
//! Read-only aggregates computed on demand from stored reports. The
//! database layer fetches plain observations; everything here is a pure
//! function of those observations and the current time, so each aggregate
//! reflects the store at query time and can be tested without a database.
//!
//! Shared edge-case policy: an empty input yields an empty result, and a
//! zero (or non-finite) mean predicted price is treated as "no data" for
//! that group instead of producing an infinite deviation.

pub mod market_map;
pub mod trends;
pub mod user_stats;

pub use market_map::{market_map, market_snapshot, MarketComparison, MarketSnapshot, ScoredObservation};
pub use trends::{price_alerts, price_trend, PriceAlert, PriceObservation, TrendPoint};
pub use user_stats::{compute_user_stats, ProductActivity, UserReportFact, UserStats};

/// Round half away from zero to `places` decimals
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Arithmetic mean; `None` for an empty slice
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Percent difference of `actual` from `reference`
///
/// `None` when the reference is zero or either input is not finite.
pub(crate) fn percent_change(reference: f64, actual: f64) -> Option<f64> {
    if reference == 0.0 || !reference.is_finite() || !actual.is_finite() {
        return None;
    }
    let change = (actual - reference) * 100.0 / reference;
    change.is_finite().then_some(change)
}
