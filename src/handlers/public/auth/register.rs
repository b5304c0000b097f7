// handlers/public/auth/register.rs - POST /register handler

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::normalize_email;
use crate::api::ApiJson;
use crate::app::AppState;
use crate::auth::{hash_password, validate_password_strength};
use crate::database::models::NewUser;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub id: i64,
}

/**
 * POST /register - Create a self-service account
 *
 * Self-registered accounts always receive role `User`; admins are created
 * with the `create-user` command.
 */
pub async fn register_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ApiResult<RegisterResponse> {
    let full_name = body
        .full_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::invalid_field("full_name", "Full name is required"))?;
    let email = normalize_email(body.email.as_deref())
        .ok_or_else(|| ApiError::invalid_field("email", "Email is required"))?;
    let password = body
        .password
        .ok_or_else(|| ApiError::invalid_field("password", "Password is required"))?;

    validate_password_strength(&password).map_err(|msg| ApiError::invalid_field("password", msg))?;

    let password_hash = hash_password(&password, state.config.security.bcrypt_cost).await?;
    let id = state
        .store
        .create_user(NewUser {
            full_name,
            email: email.clone(),
            password_hash,
            contact_number: body.contact_number.filter(|c| !c.trim().is_empty()),
            role: Role::User,
        })
        .await?;

    info!("Registered user {} ({})", id, email);
    Ok(ApiResponse::created(RegisterResponse {
        message: "User registered successfully",
        id,
    }))
}
