use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::auth::AuthUser;
use crate::app::AppState;
use crate::error::ApiError;

/// Elevated tier check. Runs after `jwt_auth_middleware` and reloads the user
/// so a demoted or deleted account loses access before its token expires.
pub async fn validate_admin_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before role validation"))?;

    if auth_user.is_anonymous() && !state.config.security.enforce_auth {
        return Ok(next.run(request).await);
    }

    let user = state
        .store
        .find_user(auth_user.id)
        .await?
        .ok_or_else(|| {
            warn!("Token for user {} refers to a deleted account", auth_user.id);
            ApiError::unauthorized("User no longer exists")
        })?;

    if !user.role.is_admin() {
        warn!("User {} attempted an admin operation", user.id);
        return Err(ApiError::forbidden("Admin access required"));
    }

    Ok(next.run(request).await)
}
