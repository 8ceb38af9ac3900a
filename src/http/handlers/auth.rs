//! `/auth` routes.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use super::json_body;
use crate::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::error::Result;
use crate::http::server::AppState;

pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let request = json_body(payload)?;
    Ok(Json(state.identity.register(request).await?))
}

pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let request = json_body(payload)?;
    Ok(Json(state.identity.login(request).await?))
}
