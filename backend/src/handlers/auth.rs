//! HTTP handlers for authentication endpoints

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::auth::{AuthResponse, AuthService, LoginInput, RegisterInput};
use crate::AppState;

/// Register a new end-user account
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<Json<AuthResponse>> {
    let service = AuthService::new(
        state.stores.clone(),
        state.config.jwt.secret.clone(),
        state.config.jwt.access_token_expiry,
    );
    let response = service.register(input).await?;
    Ok(Json(response))
}

/// Exchange credentials for an access token
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<AuthResponse>> {
    let service = AuthService::new(
        state.stores.clone(),
        state.config.jwt.secret.clone(),
        state.config.jwt.access_token_expiry,
    );
    let response = service.login(input).await?;
    Ok(Json(response))
}
