// handlers/protected/dependents/permitted_uses.rs - POST /api/permitted-uses

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::require_property_id;
use crate::api::{input, ApiJson};
use crate::app::AppState;
use crate::database::models::NewPermittedUse;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct PermittedUsesRequest {
    #[serde(default, deserialize_with = "input::opt_i64")]
    pub property_id: Option<i64>,
    #[serde(default)]
    pub uses: Vec<PermittedUseInput>,
}

#[derive(Debug, Deserialize)]
pub struct PermittedUseInput {
    #[serde(default, deserialize_with = "input::opt_string")]
    pub use_type: Option<String>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub lot_area_sqft: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub lot_width_ft: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub lot_depth_ft: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub setback_front_ft: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub setback_back_ft: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub setback_side_ft: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub max_height_ft: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_i32")]
    pub parking_spaces_required: Option<i32>,
}

impl PermittedUseInput {
    fn into_new(self) -> Result<NewPermittedUse, ApiError> {
        let use_type = self
            .use_type
            .ok_or_else(|| ApiError::invalid_field("use_type", "Missing required 'use_type'."))?;

        Ok(NewPermittedUse {
            use_type,
            lot_area_sqft: self.lot_area_sqft,
            lot_width_ft: self.lot_width_ft,
            lot_depth_ft: self.lot_depth_ft,
            setback_front_ft: self.setback_front_ft,
            setback_back_ft: self.setback_back_ft,
            setback_side_ft: self.setback_side_ft,
            max_height_ft: self.max_height_ft,
            parking_spaces_required: self.parking_spaces_required,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PermittedUsesCreated {
    pub message: &'static str,
    pub use_ids: Vec<i64>,
}

pub async fn permitted_uses_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PermittedUsesRequest>,
) -> ApiResult<PermittedUsesCreated> {
    if body.property_id.is_none() || body.uses.is_empty() {
        return Err(ApiError::bad_request(
            "Invalid input. 'property_id' and 'uses' are required.",
        ));
    }
    let property_id = require_property_id(body.property_id)?;

    let uses = body
        .uses
        .into_iter()
        .map(PermittedUseInput::into_new)
        .collect::<Result<Vec<_>, _>>()?;

    let use_ids = state.store.insert_permitted_uses(property_id, uses).await?;
    info!("Added {} permitted use(s) to property {}", use_ids.len(), property_id);

    Ok(ApiResponse::success(PermittedUsesCreated {
        message: "Lot zoning details added successfully.",
        use_ids,
    }))
}
