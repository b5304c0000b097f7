// handlers/public/auth/password.rs - password recovery
//
// POST /forgot-password emails a short-lived reset link,
// POST /reset-password?token= sets the new password.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::normalize_email;
use crate::api::ApiJson;
use crate::app::AppState;
use crate::auth::{
    decode_token, hash_password, issue_reset_token, validate_password_strength, TokenPurpose,
};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::OutgoingMail;

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub async fn forgot_password_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ForgotPasswordRequest>,
) -> ApiResult<MessageResponse> {
    let email = normalize_email(body.email.as_deref())
        .ok_or_else(|| ApiError::bad_request("Email is required"))?;

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        return Err(ApiError::bad_request("Email not found"));
    };

    let token = issue_reset_token(&user, &state.config.security)?;
    let reset_url = format!(
        "{}/reset-password?token={}",
        state.config.mail.client_url.trim_end_matches('/'),
        token
    );

    state
        .mailer
        .send(OutgoingMail {
            to: user.email.clone(),
            subject: "Password Reset Request".to_string(),
            body: format!("Click the link below to reset your password:\n\n{}", reset_url),
        })
        .await?;

    info!("Password reset requested for user {}", user.id);
    Ok(ApiResponse::success(MessageResponse {
        message: "Password reset email sent successfully",
    }))
}

pub async fn reset_password_post(
    State(state): State<AppState>,
    Query(query): Query<ResetQuery>,
    ApiJson(body): ApiJson<ResetPasswordRequest>,
) -> ApiResult<MessageResponse> {
    let (Some(token), Some(new_password)) = (
        query.token.filter(|t| !t.is_empty()),
        body.new_password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Token and new password are required"));
    };

    let claims = decode_token(&token, TokenPurpose::PasswordReset, &state.config.security)
        .map_err(|e| {
            warn!("Token verification error: {}", e);
            ApiError::bad_request("Invalid or expired token")
        })?;

    validate_password_strength(&new_password).map_err(ApiError::bad_request)?;

    let password_hash = hash_password(&new_password, state.config.security.bcrypt_cost).await?;
    state.store.set_password(claims.sub, &password_hash).await?;

    info!("Password updated for user {}", claims.sub);
    Ok(ApiResponse::success(MessageResponse {
        message: "Password updated successfully",
    }))
}
