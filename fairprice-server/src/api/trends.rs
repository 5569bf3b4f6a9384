//! Price-change alerts and product trends

use axum::{
    extract::{Query, State},
    Json,
};
use fairprice_common::api::ApiResponse;
use fairprice_common::time::{self, days_before};
use serde::Deserialize;

use super::auth::{Authorized, IsUser};
use crate::analytics::trends::TREND_WINDOW_DAYS;
use crate::analytics::{price_alerts, price_trend, PriceAlert, TrendPoint};
use crate::db::reports::verified_observations;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TrendQuery {
    pub product: Option<String>,
    pub area: Option<String>,
}

/// GET /trends/alerts
///
/// Global, not scoped to the caller.
pub async fn alerts(
    State(state): State<AppState>,
    _caller: Authorized<IsUser>,
) -> ApiResult<Json<ApiResponse<Vec<PriceAlert>>>> {
    let now = time::now();
    let observations = verified_observations(&state.db, days_before(now, TREND_WINDOW_DAYS)).await?;
    Ok(Json(ApiResponse::ok(price_alerts(&observations, now))))
}

/// GET /trends/product?product&area
pub async fn product_trends(
    State(state): State<AppState>,
    _caller: Authorized<IsUser>,
    Query(query): Query<TrendQuery>,
) -> ApiResult<Json<ApiResponse<Vec<TrendPoint>>>> {
    let product = query
        .product
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Product name is required".to_string()))?;

    let now = time::now();
    let observations = verified_observations(&state.db, days_before(now, TREND_WINDOW_DAYS)).await?;
    let trend = price_trend(&observations, product, query.area.as_deref(), now);

    Ok(Json(ApiResponse::ok(trend)))
}
