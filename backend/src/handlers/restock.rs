//! HTTP handlers for restock recommendation endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::restock::{RestockQuery, RestockRecommendation, RestockService};
use crate::AppState;

/// Compute restock recommendations, most urgent first
pub async fn restock_recommendations(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<RestockQuery>,
) -> AppResult<Json<Vec<RestockRecommendation>>> {
    let service = RestockService::new(
        state.stores.clone(),
        state.stores.clone(),
        state.stores.clone(),
    );
    let recommendations = service.recommend(&current_user.0, &query).await?;
    Ok(Json(recommendations))
}
