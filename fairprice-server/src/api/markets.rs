//! Market map endpoint (public)

use axum::{
    extract::{Query, State},
    Json,
};
use fairprice_common::api::ApiResponse;
use fairprice_common::catalog::{list_names, Month, Product};
use serde::Deserialize;

use crate::analytics::{market_map, MarketComparison};
use crate::db::reports::scored_observations;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct MapQuery {
    pub product: Option<String>,
    pub month: Option<String>,
}

/// GET /markets/map-view?product&month
///
/// Observed vs. predicted price per market for one product in one month.
/// Markets without scored reports are absent from `data`.
pub async fn map_view(
    State(state): State<AppState>,
    Query(query): Query<MapQuery>,
) -> ApiResult<Json<ApiResponse<Vec<MarketComparison>>>> {
    let (Some(product), Some(month)) = (query.product.as_deref(), query.month.as_deref()) else {
        return Err(ApiError::BadRequest("Product and month are required".to_string()));
    };

    let product = Product::parse(product).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Invalid product. Must be one of: {}",
            list_names(&Product::ALL, Product::as_str)
        ))
    })?;
    let month = Month::parse(month).ok_or_else(|| ApiError::BadRequest("Invalid month".to_string()))?;

    let observations = scored_observations(&state.db, product.as_str(), Some(month)).await?;
    let markets = market_map(&observations);

    if markets.is_empty() {
        return Ok(Json(
            ApiResponse::ok(markets).with_message("No data available for selected filters"),
        ));
    }
    Ok(Json(ApiResponse::ok(markets)))
}
