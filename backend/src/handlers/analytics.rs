//! HTTP handlers for analytics endpoints

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::analytics::{AnalyticsService, Dashboard};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub warehouse_id: Option<i64>,
}

fn analytics_service(state: &AppState) -> AnalyticsService {
    AnalyticsService::new(
        state.stores.clone(),
        state.stores.clone(),
        state.stores.clone(),
    )
}

/// Build the analytics dashboard for the caller's scope
pub async fn analytics_dashboard(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<Dashboard>> {
    let dashboard = analytics_service(&state)
        .build_dashboard(&current_user.0, query.warehouse_id)
        .await?;
    Ok(Json(dashboard))
}

/// Download the dashboard's monthly tables as CSV
pub async fn export_analytics_csv(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<impl IntoResponse> {
    let export = analytics_service(&state)
        .export_csv(&current_user.0, query.warehouse_id)
        .await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.content,
    ))
}
