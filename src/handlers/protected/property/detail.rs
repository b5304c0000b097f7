// handlers/protected/property/detail.rs - GET /api/property/:id

use axum::extract::{Path, State};

use crate::api::{aggregate_property, PropertyDetail};
use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::path_id;
use crate::middleware::{ApiResponse, ApiResult};

/**
 * GET /api/property/:id - Composite property record
 *
 * Loads the joined property rows and folds them into one object with
 * `permitted_uses`, `adu_details` and `jadu_details` keyed by type.
 */
pub async fn property_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PropertyDetail> {
    let property_id = path_id(&id)?;
    let rows = state.store.property_rows(property_id).await?;

    let detail = aggregate_property(&rows).ok_or_else(|| ApiError::not_found("Property not found."))?;
    Ok(ApiResponse::success(detail))
}
