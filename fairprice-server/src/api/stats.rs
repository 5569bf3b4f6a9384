//! Per-user statistics endpoint

use axum::{extract::State, Json};
use fairprice_common::api::ApiResponse;
use fairprice_common::time;

use super::auth::{Authorized, IsUser};
use crate::analytics::{compute_user_stats, UserStats};
use crate::db::reports::user_report_facts;
use crate::error::ApiResult;
use crate::AppState;

/// GET /stats/me
pub async fn my_stats(
    State(state): State<AppState>,
    caller: Authorized<IsUser>,
) -> ApiResult<Json<ApiResponse<UserStats>>> {
    let facts = user_report_facts(&state.db, caller.identity_id()).await?;
    Ok(Json(ApiResponse::ok(compute_user_stats(&facts, time::now()))))
}
