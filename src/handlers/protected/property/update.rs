// handlers/protected/property/update.rs - PATCH /property_update/:id

use axum::extract::{Path, State};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::api::ApiJson;
use crate::app::AppState;
use crate::database::models::PropertyPatch;
use crate::error::ApiError;
use crate::handlers::path_id;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct PropertyUpdated {
    pub message: &'static str,
}

/// Partial update of whitelisted columns. Unknown keys are ignored; a body
/// with no recognized key is rejected before touching the store.
pub async fn property_patch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<PropertyUpdated> {
    let property_id = path_id(&id)?;
    let Value::Object(fields) = body else {
        return Err(ApiError::bad_request("Request body must be a JSON object"));
    };

    let patch = PropertyPatch::from_json(&fields)
        .map_err(|errors| ApiError::validation_error("Invalid field values", Some(errors)))?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("No update fields provided."));
    }

    state.store.update_property(property_id, &patch).await?;
    info!("Updated {} field(s) on property {}", patch.fields.len(), property_id);

    Ok(ApiResponse::success(PropertyUpdated {
        message: "Property updated successfully",
    }))
}
