//! HTTP handlers for purchase order endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::PurchaseOrder;
use crate::services::purchase_order::{CreatePurchaseOrderInput, PurchaseOrderService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PurchaseOrderListQuery {
    pub warehouse_id: Option<i64>,
}

fn purchase_order_service(state: &AppState) -> PurchaseOrderService {
    PurchaseOrderService::new(
        state.stores.clone(),
        state.stores.clone(),
        state.stores.clone(),
        state.stores.clone(),
        state.dispatcher.clone(),
    )
}

/// List purchase orders visible to the caller
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<PurchaseOrderListQuery>,
) -> AppResult<Json<Vec<PurchaseOrder>>> {
    let orders = purchase_order_service(&state)
        .list(&current_user.0, query.warehouse_id)
        .await?;
    Ok(Json(orders))
}

/// Create a purchase order and dispatch it to the vendor
pub async fn create_purchase_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePurchaseOrderInput>,
) -> AppResult<Json<PurchaseOrder>> {
    let order = purchase_order_service(&state)
        .create(&current_user.0, input)
        .await?;
    Ok(Json(order))
}
