//! Report endpoints
//!
//! Submission, the caller's own history, deletion by the owner, and the
//! review queue for verifiers and admins.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use fairprice_common::api::{validate_pagination, ApiResponse};
use fairprice_common::time;
use fairprice_common::validation::ReportInput;
use fairprice_common::{Report, ReportStatus};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::auth::{Authorized, IsUser, IsVerifier};
use super::json_body;
use crate::db::reports as store;
use crate::error::{ApiError, ApiResult};
use crate::services::{ingest_report, CreatedReport};
use crate::AppState;

/// Reports returned by `/reports/recent`
pub const RECENT_LIMIT: i64 = 5;

/// Raw listing query; every value is optional and sanitised before use
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub status: Option<String>,
}

fn parse_report_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid report id".to_string()))
}

/// POST /reports/create
pub async fn create_report(
    State(state): State<AppState>,
    caller: Authorized<IsUser>,
    body: Result<Json<ReportInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CreatedReport>>)> {
    let input = json_body(body)?;

    let created = ingest_report(
        &state.db,
        state.variant,
        state.oracle.as_deref(),
        caller.identity_id(),
        input,
        time::now(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(created).with_message("Report created successfully")),
    ))
}

/// GET /reports/my-reports?page&limit
pub async fn my_reports(
    State(state): State<AppState>,
    caller: Authorized<IsUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Report>>>> {
    let page = validate_pagination(query.page.as_deref(), query.limit.as_deref());
    let (reports, total) = store::list_user_reports(&state.db, caller.identity_id(), page).await?;

    Ok(Json(ApiResponse::ok(reports).with_pagination(page.meta(total))))
}

/// GET /reports/recent
pub async fn recent_reports(
    State(state): State<AppState>,
    caller: Authorized<IsUser>,
) -> ApiResult<Json<ApiResponse<Vec<Report>>>> {
    let reports = store::recent_user_reports(&state.db, caller.identity_id(), RECENT_LIMIT).await?;
    Ok(Json(ApiResponse::ok(reports)))
}

/// DELETE /reports/:id
///
/// Only the owner may delete. The ownership check and the delete are two
/// statements; a concurrent delete of the same report may win in between.
pub async fn delete_report(
    State(state): State<AppState>,
    caller: Authorized<IsUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let id = parse_report_id(&id)?;

    if store::find_owned_report(&state.db, id, caller.identity_id())
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Report not found or unauthorized".to_string()));
    }

    if !store::delete_report(&state.db, id).await? {
        return Err(ApiError::NotFound("Report not found or unauthorized".to_string()));
    }

    info!(report_id = %id, user = caller.identity_id(), "Report deleted");
    Ok(Json(ApiResponse::message("Report deleted successfully")))
}

/// GET /reports/all?page&limit&status
///
/// `status` filters only when it names a real status; anything else is
/// ignored.
pub async fn all_reports(
    State(state): State<AppState>,
    _caller: Authorized<IsVerifier>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Report>>>> {
    let page = validate_pagination(query.page.as_deref(), query.limit.as_deref());
    let status = query.status.as_deref().and_then(ReportStatus::parse);

    let (reports, total) = store::list_all_reports(&state.db, status, page).await?;
    Ok(Json(ApiResponse::ok(reports).with_pagination(page.meta(total))))
}

/// PATCH /reports/verify/:id
///
/// Moves a pending report to `verified` or `flagged`, once. Lookup and
/// update are separate statements, so two concurrent reviews can both pass
/// the pending check; the later write wins.
pub async fn verify_report(
    State(state): State<AppState>,
    caller: Authorized<IsVerifier>,
    Path(id): Path<String>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Report>>> {
    let id = parse_report_id(&id)?;
    let request = json_body(body)?;

    let status = request
        .status
        .as_deref()
        .and_then(ReportStatus::parse)
        .filter(|s| s.is_review_outcome())
        .ok_or_else(|| {
            ApiError::BadRequest(r#"Invalid status. Must be "verified" or "flagged""#.to_string())
        })?;

    let mut report = store::find_report(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Report not found".to_string()))?;

    if report.status != ReportStatus::Pending {
        return Err(ApiError::Conflict(format!(
            "Report has already been reviewed ({})",
            report.status
        )));
    }

    let now = time::from_millis(time::to_millis(time::now()));
    if !store::set_review_outcome(&state.db, id, status, caller.identity_id(), now).await? {
        return Err(ApiError::NotFound("Report not found".to_string()));
    }

    report.status = status;
    report.verified_by = Some(caller.identity_id().to_string());
    report.verified_at = Some(now);
    report.updated_at = now;

    info!(report_id = %id, status = %status, verifier = caller.identity_id(), "Report reviewed");
    Ok(Json(ApiResponse::ok(report).with_message("Report verified successfully")))
}
