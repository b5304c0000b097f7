// handlers/public/auth/login.rs - POST /login handler

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::normalize_email;
use crate::api::ApiJson;
use crate::app::AppState;
use crate::auth::{issue_session_token, verify_password};
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub role: Role,
    pub user: User,
}

/// POST /login - exchange credentials for a session token
pub async fn login_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let (Some(email), Some(password)) = (normalize_email(body.email.as_deref()), body.password) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    // Same message for unknown email and wrong password
    let invalid = || ApiError::unauthorized("Invalid email or password");

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        warn!("Login attempt for unknown email {}", email);
        return Err(invalid());
    };

    if !verify_password(&password, &user.password).await? {
        warn!("Failed login for user {}", user.id);
        return Err(invalid());
    }

    let token = issue_session_token(&user, &state.config.security)?;
    info!("User {} logged in", user.id);

    Ok(ApiResponse::success(LoginResponse {
        message: "Login successful",
        token,
        role: user.role,
        user,
    }))
}
