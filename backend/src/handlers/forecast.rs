//! HTTP handlers for demand forecast endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::forecast::{ForecastItem, ForecastService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub warehouse_id: Option<i64>,
}

/// Demand forecast for every product visible to the caller
pub async fn demand_forecast(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ForecastQuery>,
) -> AppResult<Json<Vec<ForecastItem>>> {
    let service = ForecastService::new(state.stores.clone(), state.stores.clone());
    let items = service.forecast(&current_user.0, query.warehouse_id).await?;
    Ok(Json(items))
}
