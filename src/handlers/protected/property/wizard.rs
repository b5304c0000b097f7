// handlers/protected/property/wizard.rs - GET /api/properties/:id/wizard

use axum::extract::{Path, State};

use crate::app::AppState;
use crate::handlers::path_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::WizardProgress;

/// Where the property stands in the data entry sequence
pub async fn wizard_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<WizardProgress> {
    let property_id = path_id(&id)?;
    let step = state.store.wizard_step(property_id).await?;
    Ok(ApiResponse::success(WizardProgress::new(property_id, step)))
}
