//! Per-product pages: market snapshot and price trend

use axum::{
    extract::{Path, State},
    Json,
};
use fairprice_common::api::ApiResponse;
use fairprice_common::catalog::Product;
use fairprice_common::time::{self, days_before};

use super::auth::{Authorized, IsUser};
use crate::analytics::trends::TREND_WINDOW_DAYS;
use crate::analytics::{market_snapshot, price_trend, MarketSnapshot, TrendPoint};
use crate::db::reports::{scored_observations, verified_observations};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const NOT_ENOUGH_DATA: &str = "Not enough data";

fn parse_product(name: &str) -> ApiResult<Product> {
    Product::parse(name).ok_or_else(|| ApiError::BadRequest("Invalid product name".to_string()))
}

fn with_empty_notice<T: serde::Serialize>(items: Vec<T>) -> Json<ApiResponse<Vec<T>>> {
    if items.is_empty() {
        Json(ApiResponse::ok(items).with_message(NOT_ENOUGH_DATA))
    } else {
        Json(ApiResponse::ok(items))
    }
}

/// GET /products/:name/markets
pub async fn product_markets(
    State(state): State<AppState>,
    _caller: Authorized<IsUser>,
    Path(name): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<MarketSnapshot>>>> {
    let product = parse_product(&name)?;
    let observations = scored_observations(&state.db, product.as_str(), None).await?;
    Ok(with_empty_notice(market_snapshot(&observations)))
}

/// GET /products/:name/trend
///
/// Same daily trend as `/trends/product`, without an area filter.
pub async fn product_trend(
    State(state): State<AppState>,
    _caller: Authorized<IsUser>,
    Path(name): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<TrendPoint>>>> {
    let product = parse_product(&name)?;
    let now = time::now();
    let observations = verified_observations(&state.db, days_before(now, TREND_WINDOW_DAYS)).await?;
    Ok(with_empty_notice(price_trend(&observations, product.as_str(), None, now)))
}
