//! HTTP handlers for sales endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::Sale;
use crate::services::sales::{RecordSaleInput, SaleHistory, SalesService, WarehouseSalesReport};
use crate::store::SalesTotals;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SalesSummaryQuery {
    pub warehouse_id: Option<i64>,
}

fn sales_service(state: &AppState) -> SalesService {
    SalesService::new(
        state.stores.clone(),
        state.stores.clone(),
        state.stores.clone(),
        state.stores.clone(),
    )
}

/// Purchase a product as an end user
pub async fn purchase_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordSaleInput>,
) -> AppResult<Json<Sale>> {
    let sale = sales_service(&state)
        .record_sale(&current_user.0, input)
        .await?;
    Ok(Json(sale))
}

/// The calling user's purchase history
pub async fn my_purchase_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<SaleHistory>> {
    let history = sales_service(&state).history(&current_user.0).await?;
    Ok(Json(history))
}

/// Sales totals for the caller's scope
pub async fn sales_summary(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SalesSummaryQuery>,
) -> AppResult<Json<SalesTotals>> {
    let totals = sales_service(&state)
        .summary(&current_user.0, query.warehouse_id)
        .await?;
    Ok(Json(totals))
}

/// Recent sales and totals for a manager's warehouse
pub async fn warehouse_sales_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<WarehouseSalesReport>> {
    let report = sales_service(&state)
        .warehouse_report(&current_user.0)
        .await?;
    Ok(Json(report))
}
