// handlers/elevated/users.rs - account management for admins

use axum::{
    extract::{Path, State},
    Extension,
};
use serde::Serialize;
use tracing::info;

use crate::api::ApiJson;
use crate::app::AppState;
use crate::database::models::{User, UserUpdate};
use crate::error::ApiError;
use crate::handlers::path_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Serialize)]
pub struct UserDeleted {
    pub message: &'static str,
    pub id: i64,
}

/// GET /users
pub async fn users_get(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    Ok(ApiResponse::success(state.store.list_users().await?))
}

/// PUT /users/:id - full_name, email, contact_number, role
pub async fn user_put(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(mut body): ApiJson<UserUpdate>,
) -> ApiResult<User> {
    let id = path_id(&id)?;

    if let Some(email) = body.email.take() {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(ApiError::invalid_field("email", "Email cannot be empty"));
        }
        body.email = Some(email);
    }
    if body.full_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::invalid_field("full_name", "Full name cannot be empty"));
    }

    let user = state.store.update_user(id, &body).await?;
    info!("Admin {} updated user {}", admin.id, id);
    Ok(ApiResponse::success(user))
}

/// DELETE /users/:id - an admin cannot delete their own account
pub async fn user_delete(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<UserDeleted> {
    let id = path_id(&id)?;
    if id == admin.id {
        return Err(ApiError::conflict("You cannot delete your own account"));
    }

    state.store.delete_user(id).await?;
    info!("Admin {} deleted user {}", admin.id, id);
    Ok(ApiResponse::success(UserDeleted {
        message: "User deleted successfully",
        id,
    }))
}
