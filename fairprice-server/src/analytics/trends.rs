//! Price trends and price-change alerts
//!
//! Both work on verified reports from the trailing 30 days. The "area" of
//! a market-variant report is its market name.

use chrono::{DateTime, NaiveDate, Utc};
use fairprice_common::time::days_before;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{mean, percent_change, round_to};

/// Trailing window for trends and alerts
pub const TREND_WINDOW_DAYS: i64 = 30;
/// Smallest (product, area) group that can raise an alert
pub const ALERT_MIN_REPORTS: usize = 3;
/// Change beyond which an alert is raised (strictly greater)
pub const ALERT_THRESHOLD_PCT: f64 = 10.0;
/// Change beyond which an alert is `high` severity
pub const HIGH_SEVERITY_PCT: f64 = 20.0;

/// One verified price observation
#[derive(Debug, Clone, PartialEq)]
pub struct PriceObservation {
    pub product_name: String,
    pub area: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

/// Daily summary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// UTC calendar day, `YYYY-MM-DD`
    pub date: NaiveDate,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub report_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Increase,
    Decrease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Medium,
    High,
}

/// Significant price movement for one (product, area) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    pub product: String,
    pub area: String,
    pub old_price: f64,
    pub new_price: f64,
    /// Percent, 2 decimals
    pub change: f64,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: AlertSeverity,
}

fn in_window(obs: &PriceObservation, now: DateTime<Utc>) -> bool {
    obs.created_at >= days_before(now, TREND_WINDOW_DAYS)
}

/// Daily price trend for `product`
///
/// The product must match exactly, ignoring case; `area`, when given, is a
/// case-insensitive substring match. Days are ordered oldest first.
pub fn price_trend(
    observations: &[PriceObservation],
    product: &str,
    area: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<TrendPoint> {
    let product = product.trim().to_lowercase();
    let area = area.map(|a| a.trim().to_lowercase()).filter(|a| !a.is_empty());

    let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for obs in observations {
        if !in_window(obs, now) || obs.product_name.to_lowercase() != product {
            continue;
        }
        if let Some(area) = &area {
            if !obs.area.to_lowercase().contains(area.as_str()) {
                continue;
            }
        }
        by_day.entry(obs.created_at.date_naive()).or_default().push(obs.price);
    }

    by_day
        .into_iter()
        .filter_map(|(date, prices)| {
            let avg = mean(&prices)?;
            let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
            let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            Some(TrendPoint {
                date,
                avg_price: round_to(avg, 2),
                min_price: round_to(min, 2),
                max_price: round_to(max, 2),
                report_count: prices.len() as i64,
            })
        })
        .collect()
}

/// Price-change alerts across all products and areas
///
/// Each (product, area) group with at least [`ALERT_MIN_REPORTS`] reports
/// compares its earliest and latest price. Groups whose change exceeds
/// [`ALERT_THRESHOLD_PCT`] are returned, largest absolute change first.
/// Both thresholds apply to the unrounded change; only the reported
/// `change` is rounded to 2 decimals.
/// Reports created at the same instant keep their input order.
pub fn price_alerts(observations: &[PriceObservation], now: DateTime<Utc>) -> Vec<PriceAlert> {
    let mut groups: BTreeMap<(&str, &str), Vec<&PriceObservation>> = BTreeMap::new();
    for obs in observations.iter().filter(|o| in_window(o, now)) {
        groups
            .entry((obs.product_name.as_str(), obs.area.as_str()))
            .or_default()
            .push(obs);
    }

    let mut alerts: Vec<PriceAlert> = groups
        .into_iter()
        .filter(|(_, group)| group.len() >= ALERT_MIN_REPORTS)
        .filter_map(|((product, area), mut group)| {
            group.sort_by_key(|o| o.created_at);
            let old_price = group.first()?.price;
            let new_price = group.last()?.price;
            let raw_change = percent_change(old_price, new_price)?;

            if raw_change.abs() <= ALERT_THRESHOLD_PCT {
                return None;
            }

            Some(PriceAlert {
                product: product.to_string(),
                area: area.to_string(),
                old_price: round_to(old_price, 2),
                new_price: round_to(new_price, 2),
                change: round_to(raw_change, 2),
                kind: if raw_change > 0.0 {
                    AlertKind::Increase
                } else {
                    AlertKind::Decrease
                },
                severity: if raw_change.abs() > HIGH_SEVERITY_PCT {
                    AlertSeverity::High
                } else {
                    AlertSeverity::Medium
                },
            })
        })
        .collect();

    alerts.sort_by(|a, b| b.change.abs().total_cmp(&a.change.abs()));
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 30, 12, 0, 0).unwrap()
    }

    fn obs(product: &str, area: &str, price: f64, age_hours: i64) -> PriceObservation {
        PriceObservation {
            product_name: product.to_string(),
            area: area.to_string(),
            price,
            created_at: now() - Duration::hours(age_hours),
        }
    }

    // ========================================================================
    // Trend
    // ========================================================================

    #[test]
    fn test_trend_groups_by_day_oldest_first() {
        let data = vec![
            obs("Onion", "Azadpur", 40.0, 1),
            obs("Onion", "Azadpur", 44.0, 2),
            obs("Onion", "Okhla", 30.0, 48),
        ];
        let trend = price_trend(&data, "Onion", None, now());
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].date, NaiveDate::from_ymd_opt(2026, 6, 28).unwrap());
        assert_eq!(trend[0].report_count, 1);
        assert_eq!(trend[1].avg_price, 42.0);
        assert_eq!(trend[1].min_price, 40.0);
        assert_eq!(trend[1].max_price, 44.0);
        assert_eq!(trend[1].report_count, 2);
    }

    #[test]
    fn test_trend_product_and_area_matching() {
        let data = vec![
            obs("Onion", "Karol Bagh", 40.0, 1),
            obs("onion", "Lajpat Nagar", 50.0, 1),
            obs("Red Onion", "Karol Bagh", 60.0, 1),
        ];
        let all = price_trend(&data, "ONION", None, now());
        assert_eq!(all[0].report_count, 2);

        let karol = price_trend(&data, "Onion", Some("karol"), now());
        assert_eq!(karol[0].report_count, 1);
        assert_eq!(karol[0].avg_price, 40.0);
    }

    #[test]
    fn test_trend_ignores_reports_outside_window() {
        let data = vec![obs("Milk", "Rohini", 60.0, 24 * 31)];
        assert!(price_trend(&data, "Milk", None, now()).is_empty());
    }

    #[test]
    fn test_trend_date_serializes_as_iso_day() {
        let trend = price_trend(&[obs("Milk", "Rohini", 60.0, 1)], "Milk", None, now());
        let json = serde_json::to_value(&trend[0]).unwrap();
        assert_eq!(json["date"], "2026-06-30");
        assert_eq!(json["reportCount"], 1);
    }

    // ========================================================================
    // Alerts
    // ========================================================================

    #[test]
    fn test_groups_below_three_reports_never_alert() {
        let one = vec![obs("Onion", "Azadpur", 10.0, 1)];
        assert!(price_alerts(&one, now()).is_empty());

        let two = vec![obs("Onion", "Azadpur", 10.0, 5), obs("Onion", "Azadpur", 50.0, 1)];
        assert!(price_alerts(&two, now()).is_empty());
    }

    #[test]
    fn test_small_change_never_alerts() {
        let data = vec![
            obs("Onion", "Azadpur", 100.0, 5),
            obs("Onion", "Azadpur", 150.0, 3),
            obs("Onion", "Azadpur", 110.0, 1),
        ];
        // Exactly 10% compares earliest with latest only
        assert!(price_alerts(&data, now()).is_empty());
    }

    #[test]
    fn test_thresholds_use_unrounded_change() {
        let just_over_alert = vec![
            obs("Onion", "Azadpur", 100.0, 5),
            obs("Onion", "Azadpur", 105.0, 3),
            obs("Onion", "Azadpur", 110.004, 1),
        ];
        let alerts = price_alerts(&just_over_alert, now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].change, 10.0);
        assert_eq!(alerts[0].severity, AlertSeverity::Medium);

        let just_over_high = vec![
            obs("Onion", "Azadpur", 100.0, 5),
            obs("Onion", "Azadpur", 105.0, 3),
            obs("Onion", "Azadpur", 120.004, 1),
        ];
        let alerts = price_alerts(&just_over_high, now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].change, 20.0);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
    }

    #[test]
    fn test_increase_and_decrease_with_severity() {
        let data = vec![
            obs("Onion", "Azadpur", 40.0, 5),
            obs("Onion", "Azadpur", 42.0, 3),
            obs("Onion", "Azadpur", 50.0, 1),
            obs("Milk", "Rohini", 60.0, 5),
            obs("Milk", "Rohini", 55.0, 3),
            obs("Milk", "Rohini", 52.0, 1),
        ];
        let alerts = price_alerts(&data, now());
        assert_eq!(alerts.len(), 2);

        assert_eq!(alerts[0].product, "Onion");
        assert_eq!(alerts[0].change, 25.0);
        assert_eq!(alerts[0].kind, AlertKind::Increase);
        assert_eq!(alerts[0].severity, AlertSeverity::High);

        assert_eq!(alerts[1].product, "Milk");
        assert_eq!(alerts[1].old_price, 60.0);
        assert_eq!(alerts[1].new_price, 52.0);
        assert_eq!(alerts[1].change, -13.33);
        assert_eq!(alerts[1].kind, AlertKind::Decrease);
        assert_eq!(alerts[1].severity, AlertSeverity::Medium);
    }

    #[test]
    fn test_earliest_and_latest_follow_creation_time_not_input_order() {
        let data = vec![
            obs("Sugar", "Okhla", 50.0, 1),
            obs("Sugar", "Okhla", 45.0, 3),
            obs("Sugar", "Okhla", 40.0, 5),
        ];
        let alerts = price_alerts(&data, now());
        assert_eq!(alerts[0].old_price, 40.0);
        assert_eq!(alerts[0].new_price, 50.0);
    }

    #[test]
    fn test_areas_are_separate_groups() {
        let data = vec![
            obs("Tomato", "Okhla", 20.0, 5),
            obs("Tomato", "Okhla", 30.0, 3),
            obs("Tomato", "Rohini", 30.0, 1),
        ];
        assert!(price_alerts(&data, now()).is_empty());
    }

    #[test]
    fn test_alert_serializes_type_field() {
        let data = vec![
            obs("Onion", "Azadpur", 40.0, 5),
            obs("Onion", "Azadpur", 42.0, 3),
            obs("Onion", "Azadpur", 50.0, 1),
        ];
        let json = serde_json::to_value(&price_alerts(&data, now())[0]).unwrap();
        assert_eq!(json["type"], "increase");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["oldPrice"], 40.0);
    }
}
