//! Per-market price comparison
//!
//! Both aggregates compare the mean observed price in each market with the
//! mean price the oracle predicted for the same reports. Only ML-scored
//! reports from the fixed market list take part; a market with no such
//! report is left out entirely.

use fairprice_common::catalog::Market;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{mean, percent_change, round_to};

/// Deviation beyond which a market is flagged (strictly greater)
pub const ANOMALY_THRESHOLD_PCT: f64 = 15.0;

/// Observed and predicted price of one scored report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredObservation {
    pub market: Market,
    pub price: f64,
    pub expected_price: f64,
}

/// Map-view entry for one market (product and month fixed by the query)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketComparison {
    pub market_name: Market,
    pub actual_avg_price: f64,
    pub predicted_avg_price: f64,
    /// Percent, 2 decimals; positive when observed prices run above prediction
    pub deviation: f64,
    pub is_anomaly: bool,
}

/// Product-page entry for one market, across all months
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub market_name: Market,
    pub avg_actual_price: f64,
    pub avg_predicted_price: f64,
    /// Percent, 1 decimal
    pub deviation: f64,
    pub count: i64,
}

struct MarketMeans {
    market: Market,
    actual: f64,
    predicted: f64,
    deviation: f64,
    count: usize,
}

fn group_by_market(observations: &[ScoredObservation]) -> Vec<MarketMeans> {
    let mut grouped: BTreeMap<Market, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for obs in observations {
        let entry = grouped.entry(obs.market).or_default();
        entry.0.push(obs.price);
        entry.1.push(obs.expected_price);
    }

    grouped
        .into_iter()
        .filter_map(|(market, (actual, predicted))| {
            let actual_mean = mean(&actual)?;
            let predicted_mean = mean(&predicted)?;
            let deviation = percent_change(predicted_mean, actual_mean)?;
            Some(MarketMeans {
                market,
                actual: actual_mean,
                predicted: predicted_mean,
                deviation,
                count: actual.len(),
            })
        })
        .collect()
}

/// Market-map aggregate, ordered by market name
///
/// The anomaly flag is decided on the rounded deviation, so a deviation
/// that displays as exactly 15.00 is never flagged.
pub fn market_map(observations: &[ScoredObservation]) -> Vec<MarketComparison> {
    group_by_market(observations)
        .into_iter()
        .map(|m| {
            let deviation = round_to(m.deviation, 2);
            MarketComparison {
                market_name: m.market,
                actual_avg_price: round_to(m.actual, 2),
                predicted_avg_price: round_to(m.predicted, 2),
                deviation,
                is_anomaly: deviation.abs() > ANOMALY_THRESHOLD_PCT,
            }
        })
        .collect()
}

/// Per-product market snapshot, ordered by market name
pub fn market_snapshot(observations: &[ScoredObservation]) -> Vec<MarketSnapshot> {
    group_by_market(observations)
        .into_iter()
        .map(|m| MarketSnapshot {
            market_name: m.market,
            avg_actual_price: round_to(m.actual, 2),
            avg_predicted_price: round_to(m.predicted, 2),
            deviation: round_to(m.deviation, 1),
            count: m.count as i64,
        })
        .collect()
}
