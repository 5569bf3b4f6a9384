//! Timestamp utilities
//!
//! Timestamps are persisted as UTC milliseconds since the Unix epoch.

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert a timestamp to epoch milliseconds for storage
pub fn to_millis(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

/// Convert stored epoch milliseconds back to a timestamp
///
/// Out-of-range values (never written by this crate) clamp to the epoch.
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Start of a trailing window of `days` days ending at `now`
pub fn days_before(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_round_trip_keeps_millisecond_precision() {
        let ts = Utc.with_ymd_and_hms(2026, 6, 14, 9, 30, 0).unwrap() + Duration::milliseconds(123);
        assert_eq!(from_millis(to_millis(ts)), ts);
    }

    #[test]
    fn test_days_before() {
        let now = Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap();
        let start = days_before(now, 7);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
    }
}
