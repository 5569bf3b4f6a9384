//! Report queries
//!
//! Listings are newest first; reports created in the same millisecond keep
//! insertion order (newest first) through `rowid`.

use chrono::{DateTime, Utc};
use fairprice_common::api::PageRequest;
use fairprice_common::catalog::{Market, Month, Unit};
use fairprice_common::models::{MlAnalysis, VerificationMethod};
use fairprice_common::time::{from_millis, to_millis};
use fairprice_common::{Error, Report, ReportLocation, ReportStatus, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::analytics::{PriceObservation, ScoredObservation, UserReportFact};

const REPORT_COLUMNS: &str = "id, user_id, product_name, price, unit, variant, market_name, month, \
     store_name, area, verification_method, status, ml_mandi_benchmark, ml_expected_price, \
     ml_deviation, ml_anomaly, ml_reason, verified_by, verified_at, created_at, updated_at";

const NEWEST_FIRST: &str = "ORDER BY created_at DESC, rowid DESC";

fn corrupt(column: &str, value: &str) -> Error {
    Error::Internal(format!("Unexpected {} in reports table: {}", column, value))
}

fn report_from_row(row: &SqliteRow) -> Result<Report> {
    let id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id).map_err(|_| corrupt("id", &id))?;

    let unit: String = row.try_get("unit")?;
    let unit = Unit::parse(&unit).ok_or_else(|| corrupt("unit", &unit))?;

    let variant: String = row.try_get("variant")?;
    let location = match variant.as_str() {
        "market" => {
            let market: String = row.try_get("market_name")?;
            let month: String = row.try_get("month")?;
            ReportLocation::Market {
                market: Market::parse(&market).ok_or_else(|| corrupt("market_name", &market))?,
                month: Month::parse(&month).ok_or_else(|| corrupt("month", &month))?,
            }
        }
        "store" => ReportLocation::Store {
            store_name: row.try_get("store_name")?,
            area: row.try_get("area")?,
        },
        other => return Err(corrupt("variant", other)),
    };

    let method: String = row.try_get("verification_method")?;
    let verification_method =
        VerificationMethod::parse(&method).ok_or_else(|| corrupt("verification_method", &method))?;

    let status: String = row.try_get("status")?;
    let status = ReportStatus::parse(&status).ok_or_else(|| corrupt("status", &status))?;

    let ml_analysis = match row.try_get::<Option<f64>, _>("ml_expected_price")? {
        Some(expected_price) => Some(MlAnalysis {
            mandi_benchmark: row.try_get::<Option<f64>, _>("ml_mandi_benchmark")?.unwrap_or_default(),
            expected_price,
            deviation: row.try_get::<Option<String>, _>("ml_deviation")?.unwrap_or_default(),
            anomaly: row.try_get::<Option<i64>, _>("ml_anomaly")?.unwrap_or(0) != 0,
            reason: row.try_get::<Option<String>, _>("ml_reason")?.unwrap_or_default(),
        }),
        None => None,
    };

    Ok(Report {
        id,
        user_id: row.try_get("user_id")?,
        product_name: row.try_get("product_name")?,
        price: row.try_get("price")?,
        unit,
        location,
        verification_method,
        status,
        ml_analysis,
        verified_by: row.try_get("verified_by")?,
        verified_at: row.try_get::<Option<i64>, _>("verified_at")?.map(from_millis),
        created_at: from_millis(row.try_get("created_at")?),
        updated_at: from_millis(row.try_get("updated_at")?),
    })
}

fn reports_from_rows(rows: &[SqliteRow]) -> Result<Vec<Report>> {
    rows.iter().map(report_from_row).collect()
}

/// Persist a new report, ML analysis included, in one statement
pub async fn insert_report(pool: &SqlitePool, report: &Report) -> Result<()> {
    let (market_name, month, store_name, area) = match &report.location {
        ReportLocation::Market { market, month } => {
            (Some(market.as_str()), Some(month.as_str()), None, None)
        }
        ReportLocation::Store { store_name, area } => {
            (None, None, Some(store_name.as_str()), Some(area.as_str()))
        }
    };
    let ml = report.ml_analysis.as_ref();

    sqlx::query(
        r#"
        INSERT INTO reports (
            id, user_id, product_name, price, unit, variant,
            market_name, month, store_name, area,
            verification_method, status,
            ml_mandi_benchmark, ml_expected_price, ml_deviation, ml_anomaly, ml_reason,
            verified_by, verified_at, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(report.id.to_string())
    .bind(&report.user_id)
    .bind(&report.product_name)
    .bind(report.price)
    .bind(report.unit.as_str())
    .bind(report.location.variant().as_str())
    .bind(market_name)
    .bind(month)
    .bind(store_name)
    .bind(area)
    .bind(report.verification_method.as_str())
    .bind(report.status.as_str())
    .bind(ml.map(|m| m.mandi_benchmark))
    .bind(ml.map(|m| m.expected_price))
    .bind(ml.map(|m| m.deviation.as_str()))
    .bind(ml.map(|m| m.anomaly as i64))
    .bind(ml.map(|m| m.reason.as_str()))
    .bind(report.verified_by.as_deref())
    .bind(report.verified_at.map(to_millis))
    .bind(to_millis(report.created_at))
    .bind(to_millis(report.updated_at))
    .execute(pool)
    .await?;

    Ok(())
}

/// One page of a user's reports plus the user's total report count
pub async fn list_user_reports(
    pool: &SqlitePool,
    user_id: &str,
    page: PageRequest,
) -> Result<(Vec<Report>, i64)> {
    let sql = format!(
        "SELECT {} FROM reports WHERE user_id = ? {} LIMIT ? OFFSET ?",
        REPORT_COLUMNS, NEWEST_FIRST
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok((reports_from_rows(&rows)?, total))
}

/// A user's `limit` most recent reports
pub async fn recent_user_reports(pool: &SqlitePool, user_id: &str, limit: i64) -> Result<Vec<Report>> {
    let sql = format!(
        "SELECT {} FROM reports WHERE user_id = ? {} LIMIT ?",
        REPORT_COLUMNS, NEWEST_FIRST
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    reports_from_rows(&rows)
}

/// One page of all reports, optionally restricted to one status
pub async fn list_all_reports(
    pool: &SqlitePool,
    status: Option<ReportStatus>,
    page: PageRequest,
) -> Result<(Vec<Report>, i64)> {
    let status = status.map(ReportStatus::as_str);

    let sql = format!(
        "SELECT {} FROM reports WHERE (? IS NULL OR status = ?) {} LIMIT ? OFFSET ?",
        REPORT_COLUMNS, NEWEST_FIRST
    );
    let rows = sqlx::query(&sql)
        .bind(status)
        .bind(status)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(pool)
        .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reports WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await?;

    Ok((reports_from_rows(&rows)?, total))
}

pub async fn find_report(pool: &SqlitePool, id: Uuid) -> Result<Option<Report>> {
    let sql = format!("SELECT {} FROM reports WHERE id = ?", REPORT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(report_from_row).transpose()
}

/// Find a report only if `user_id` owns it
pub async fn find_owned_report(pool: &SqlitePool, id: Uuid, user_id: &str) -> Result<Option<Report>> {
    let sql = format!("SELECT {} FROM reports WHERE id = ? AND user_id = ?", REPORT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(report_from_row).transpose()
}

/// Delete by id; `false` when no row was removed
pub async fn delete_report(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM reports WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Record a review outcome; `false` when the report no longer exists
pub async fn set_review_outcome(
    pool: &SqlitePool,
    id: Uuid,
    status: ReportStatus,
    verified_by: &str,
    at: DateTime<Utc>,
) -> Result<bool> {
    let at = to_millis(at);
    let result = sqlx::query(
        "UPDATE reports SET status = ?, verified_by = ?, verified_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(status.as_str())
    .bind(verified_by)
    .bind(at)
    .bind(at)
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// Analytics inputs
// ============================================================================

/// Status, product, price and creation time of every report by `user_id`
pub async fn user_report_facts(pool: &SqlitePool, user_id: &str) -> Result<Vec<UserReportFact>> {
    let rows = sqlx::query(
        "SELECT status, product_name, price, created_at FROM reports WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<UserReportFact> {
            let status: String = row.try_get("status")?;
            Ok(UserReportFact {
                status: ReportStatus::parse(&status).ok_or_else(|| corrupt("status", &status))?,
                product_name: row.try_get("product_name")?,
                price: row.try_get("price")?,
                created_at: from_millis(row.try_get("created_at")?),
            })
        })
        .collect()
}

/// ML-scored market reports for `product`, optionally in one reporting month
///
/// Rows whose market is not on the fixed market list are skipped.
pub async fn scored_observations(
    pool: &SqlitePool,
    product: &str,
    month: Option<Month>,
) -> Result<Vec<ScoredObservation>> {
    let month = month.map(Month::as_str);
    let rows = sqlx::query(
        r#"
        SELECT market_name, price, ml_expected_price
        FROM reports
        WHERE variant = 'market'
          AND product_name = ?
          AND (? IS NULL OR month = ?)
          AND ml_expected_price IS NOT NULL
        "#,
    )
    .bind(product)
    .bind(month)
    .bind(month)
    .fetch_all(pool)
    .await?;

    let mut observations = Vec::with_capacity(rows.len());
    for row in &rows {
        let market: String = row.try_get("market_name")?;
        let Some(market) = Market::parse(&market) else {
            tracing::debug!("Skipping report from unlisted market: {}", market);
            continue;
        };
        observations.push(ScoredObservation {
            market,
            price: row.try_get("price")?,
            expected_price: row.try_get("ml_expected_price")?,
        });
    }
    Ok(observations)
}

/// Verified reports created at or after `since`, oldest first
///
/// A market-variant report's area is its market name.
pub async fn verified_observations(
    pool: &SqlitePool,
    since: DateTime<Utc>,
) -> Result<Vec<PriceObservation>> {
    let rows = sqlx::query(
        r#"
        SELECT product_name, COALESCE(area, market_name) AS area, price, created_at
        FROM reports
        WHERE status = 'verified' AND created_at >= ?
        ORDER BY created_at ASC, rowid ASC
        "#,
    )
    .bind(to_millis(since))
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<PriceObservation> {
            Ok(PriceObservation {
                product_name: row.try_get("product_name")?,
                area: row.try_get::<Option<String>, _>("area")?.unwrap_or_default(),
                price: row.try_get("price")?,
                created_at: from_millis(row.try_get("created_at")?),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fairprice_common::db::create_schema;
    use fairprice_common::time;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_schema(&pool).await.unwrap();
        pool
    }

    fn scored(user: &str, price: f64, expected: f64, created_at: DateTime<Utc>) -> Report {
        Report::scored(
            user.to_string(),
            "Onion".to_string(),
            price,
            Unit::Kg,
            Market::Azadpur,
            Month::June,
            MlAnalysis {
                mandi_benchmark: expected * 0.7,
                expected_price: expected,
                deviation: "0.0%".to_string(),
                anomaly: false,
                reason: "Fair Price".to_string(),
            },
            created_at,
        )
    }

    fn manual(user: &str, area: &str, created_at: DateTime<Utc>) -> Report {
        Report::manual(
            user.to_string(),
            "Rice".to_string(),
            55.0,
            Unit::Kg,
            "Green Grocers".to_string(),
            area.to_string(),
            created_at,
        )
    }

    #[tokio::test]
    async fn test_insert_and_read_back_market_report() {
        let pool = pool().await;
        let report = scored("u1", 40.0, 32.0, time::from_millis(time::to_millis(time::now())));
        insert_report(&pool, &report).await.unwrap();

        let found = find_report(&pool, report.id).await.unwrap().unwrap();
        assert_eq!(found, report);
    }

    #[tokio::test]
    async fn test_insert_and_read_back_store_report() {
        let pool = pool().await;
        let report = manual("u1", "Karol Bagh", time::from_millis(1_750_000_000_000));
        insert_report(&pool, &report).await.unwrap();

        let found = find_report(&pool, report.id).await.unwrap().unwrap();
        assert_eq!(found, report);
        assert!(found.ml_analysis.is_none());
    }

    #[tokio::test]
    async fn test_listing_is_newest_first_with_insertion_tiebreak() {
        let pool = pool().await;
        let t = time::from_millis(1_750_000_000_000);
        let first = manual("u1", "A1", t);
        let second = manual("u1", "A2", t);
        let older = manual("u1", "A0", t - Duration::hours(1));
        for r in [&older, &first, &second] {
            insert_report(&pool, r).await.unwrap();
        }

        let (page, total) = list_user_reports(&pool, "u1", PageRequest::default()).await.unwrap();
        assert_eq!(total, 3);
        let ids: Vec<_> = page.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id, older.id]);
    }

    #[tokio::test]
    async fn test_pagination_offsets() {
        let pool = pool().await;
        let t = time::from_millis(1_750_000_000_000);
        for i in 0..5 {
            insert_report(&pool, &manual("u1", "Area", t + Duration::seconds(i))).await.unwrap();
        }
        let (page, total) = list_user_reports(&pool, "u1", PageRequest { page: 2, limit: 2 })
            .await
            .unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].created_at, t + Duration::seconds(2));
    }

    #[tokio::test]
    async fn test_status_filter() {
        let pool = pool().await;
        let t = time::now();
        let a = manual("u1", "Area", t);
        let b = manual("u2", "Area", t);
        insert_report(&pool, &a).await.unwrap();
        insert_report(&pool, &b).await.unwrap();
        set_review_outcome(&pool, a.id, ReportStatus::Flagged, "v1", t).await.unwrap();

        let (flagged, total) = list_all_reports(&pool, Some(ReportStatus::Flagged), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(flagged[0].id, a.id);
        assert_eq!(flagged[0].verified_by.as_deref(), Some("v1"));

        let (_, all) = list_all_reports(&pool, None, PageRequest::default()).await.unwrap();
        assert_eq!(all, 2);
    }

    #[tokio::test]
    async fn test_find_owned_report_checks_owner() {
        let pool = pool().await;
        let report = manual("owner", "Area", time::now());
        insert_report(&pool, &report).await.unwrap();

        assert!(find_owned_report(&pool, report.id, "owner").await.unwrap().is_some());
        assert!(find_owned_report(&pool, report.id, "someone_else").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_twice_reports_second_as_missing() {
        // Delete is check-then-act in the handler; the loser of a race
        // sees nothing removed.
        let pool = pool().await;
        let report = manual("owner", "Area", time::now());
        insert_report(&pool, &report).await.unwrap();

        assert!(delete_report(&pool, report.id).await.unwrap());
        assert!(!delete_report(&pool, report.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_reviews_last_write_wins() {
        // Both reviewers passed the pending check before either wrote;
        // the update itself does not re-check status.
        let pool = pool().await;
        let t = time::from_millis(1_750_000_000_000);
        let report = manual("owner", "Area", t);
        insert_report(&pool, &report).await.unwrap();

        assert!(set_review_outcome(&pool, report.id, ReportStatus::Verified, "v1", t).await.unwrap());
        assert!(set_review_outcome(&pool, report.id, ReportStatus::Flagged, "v2", t + Duration::seconds(1))
            .await
            .unwrap());

        let found = find_report(&pool, report.id).await.unwrap().unwrap();
        assert_eq!(found.status, ReportStatus::Flagged);
        assert_eq!(found.verified_by.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_scored_observations_filter_by_month() {
        let pool = pool().await;
        let t = time::now();
        insert_report(&pool, &scored("u1", 40.0, 32.0, t)).await.unwrap();
        let mut july = scored("u1", 50.0, 45.0, t);
        july.location = ReportLocation::Market {
            market: Market::Okhla,
            month: Month::July,
        };
        insert_report(&pool, &july).await.unwrap();
        insert_report(&pool, &manual("u1", "Area", t)).await.unwrap();

        let june = scored_observations(&pool, "Onion", Some(Month::June)).await.unwrap();
        assert_eq!(june.len(), 1);
        assert_eq!(june[0].market, Market::Azadpur);

        let any = scored_observations(&pool, "Onion", None).await.unwrap();
        assert_eq!(any.len(), 2);
    }

    #[tokio::test]
    async fn test_verified_observations_use_market_as_area() {
        let pool = pool().await;
        let t = time::now();
        let market = scored("u1", 40.0, 32.0, t);
        let store = manual("u1", "Karol Bagh", t);
        let pending = manual("u1", "Okhla Phase 1", t);
        for r in [&market, &store, &pending] {
            insert_report(&pool, r).await.unwrap();
        }
        set_review_outcome(&pool, market.id, ReportStatus::Verified, "v1", t).await.unwrap();
        set_review_outcome(&pool, store.id, ReportStatus::Verified, "v1", t).await.unwrap();

        let obs = verified_observations(&pool, t - Duration::days(30)).await.unwrap();
        let areas: Vec<_> = obs.iter().map(|o| o.area.as_str()).collect();
        assert_eq!(areas, vec!["Azadpur", "Karol Bagh"]);
    }

    #[tokio::test]
    async fn test_user_report_facts() {
        let pool = pool().await;
        insert_report(&pool, &manual("u1", "Area", time::now())).await.unwrap();
        insert_report(&pool, &manual("u2", "Area", time::now())).await.unwrap();

        let facts = user_report_facts(&pool, "u1").await.unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].status, ReportStatus::Pending);
    }
}
