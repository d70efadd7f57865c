//! HTTP handlers for product catalog endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::Product;
use crate::services::product::{
    CreateProductInput, ProductQuery, ProductService, UpdateProductInput,
};
use crate::AppState;

/// List products visible to the caller
pub async fn list_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let service = ProductService::new(state.stores.clone(), state.stores.clone());
    let products = service.list(&current_user.0, &query).await?;
    Ok(Json(products))
}

/// Fetch one product
pub async fn get_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<i64>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.stores.clone(), state.stores.clone());
    let product = service.get(&current_user.0, product_id).await?;
    Ok(Json(product))
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.stores.clone(), state.stores.clone());
    let product = service.create(&current_user.0, input).await?;
    Ok(Json(product))
}

/// Update a product
pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<i64>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.stores.clone(), state.stores.clone());
    let product = service.update(&current_user.0, product_id, input).await?;
    Ok(Json(product))
}
