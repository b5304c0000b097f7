// handlers/protected/property/create.rs - POST /api/properties

use axum::{extract::State, Extension};
use serde::Serialize;
use tracing::info;

use crate::api::ApiJson;
use crate::app::AppState;
use crate::database::models::NewProperty;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Serialize)]
pub struct PropertyCreated {
    pub property_id: i64,
}

/// Creates the property and places it at the first wizard step
pub async fn property_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<NewProperty>,
) -> ApiResult<PropertyCreated> {
    let property_id = state.store.create_property(body).await?;
    info!("User {} created property {}", user.id, property_id);
    Ok(ApiResponse::success(PropertyCreated { property_id }))
}
