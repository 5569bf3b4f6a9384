//! Account onboarding and profile
//!
//! These routes need a verified identity but not an account: onboarding
//! is how the account gets created.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use fairprice_common::api::ApiResponse;
use fairprice_common::{time, Role, User};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::auth::CallerIdentity;
use super::json_body;
use crate::db::users::{find_user, insert_user};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardRequest {
    pub role: Option<String>,
    pub admin_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OnboardResponse {
    pub role: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub role: Role,
    pub onboarding_complete: bool,
}

/// POST /users/onboard
///
/// Creates the caller's single account. `verifier` and `admin` need the
/// configured admin code; without one configured they cannot be chosen.
pub async fn onboard(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
    body: Result<Json<OnboardRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<OnboardResponse>>)> {
    let request = json_body(body)?;

    if find_user(&state.db, &identity).await?.is_some() {
        return Err(ApiError::Conflict("User already onboarded".to_string()));
    }

    let role = request
        .role
        .as_deref()
        .and_then(Role::parse)
        .ok_or_else(|| ApiError::BadRequest("Invalid role".to_string()))?;

    if role.is_privileged() {
        let code_matches = match (&state.admin_code, &request.admin_code) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        };
        if !code_matches {
            warn!(identity = %identity, role = role.as_str(), "Privileged onboarding refused");
            return Err(ApiError::Forbidden("Invalid admin code".to_string()));
        }
    }

    let user = User {
        identity_id: identity,
        role,
        onboarding_complete: true,
        created_at: time::now(),
    };
    if !insert_user(&state.db, &user).await? {
        return Err(ApiError::Conflict("User already onboarded".to_string()));
    }

    info!(identity = %user.identity_id, role = role.as_str(), "User onboarded");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(OnboardResponse { role }).with_message("Onboarding successful")),
    ))
}

/// GET /users/me
pub async fn current_user(
    State(state): State<AppState>,
    CallerIdentity(identity): CallerIdentity,
) -> ApiResult<Json<ApiResponse<CurrentUserResponse>>> {
    let user = find_user(&state.db, &identity)
        .await?
        .ok_or(ApiError::NeedsOnboarding)?;

    Ok(Json(ApiResponse::ok(CurrentUserResponse {
        role: user.role,
        onboarding_complete: user.onboarding_complete,
    })))
}
