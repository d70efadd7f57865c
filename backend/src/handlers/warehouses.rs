//! HTTP handlers for warehouse endpoints

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::Warehouse;
use crate::services::warehouse::{CreateWarehouseInput, WarehouseService, WarehouseSummary};
use crate::AppState;

/// List warehouses with stock summaries
pub async fn list_warehouses(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<WarehouseSummary>>> {
    let service = WarehouseService::new(state.stores.clone(), state.stores.clone());
    let warehouses = service.list(&current_user.0).await?;
    Ok(Json(warehouses))
}

/// Create a warehouse (admins only)
pub async fn create_warehouse(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateWarehouseInput>,
) -> AppResult<Json<Warehouse>> {
    let service = WarehouseService::new(state.stores.clone(), state.stores.clone());
    let warehouse = service.create(&current_user.0, input).await?;
    Ok(Json(warehouse))
}
