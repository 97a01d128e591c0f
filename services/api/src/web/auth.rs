//! services/api/src/web/auth.rs
//!
//! Authentication endpoint: exchanges a username and password for tokens.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::error::RequestError;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /login - Authenticate a user and return tokens
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials; detail carries the provider's message", body = crate::error::ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, RequestError> {
    let tokens = state
        .credentials
        .authenticate(&req.username, &req.password)
        .await
        .map_err(|e| {
            info!(username = %req.username, "Login failed: {}", e);
            match e {
                question_paper_core::PortError::AuthenticationFailed(message) => {
                    RequestError::Authentication(message)
                }
                other => RequestError::Authentication(other.to_string()),
            }
        })?;

    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        id_token: tokens.id_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
    }))
}
