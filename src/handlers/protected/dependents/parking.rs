// handlers/protected/dependents/parking.rs - POST /api/parking-requirements

use axum::extract::State;
use serde::{Deserialize, Serialize};

use super::require_property_id;
use crate::api::{input, ApiJson};
use crate::app::AppState;
use crate::database::models::NewParkingRequirement;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct ParkingRequest {
    #[serde(default, deserialize_with = "input::opt_i64")]
    pub property_id: Option<i64>,
    #[serde(default, deserialize_with = "input::opt_i32")]
    pub parking_spaces: Option<i32>,
    #[serde(default, deserialize_with = "input::opt_bool")]
    pub eligible_for_bonus: Option<bool>,
    #[serde(default, deserialize_with = "input::opt_string")]
    pub bonus_type: Option<String>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub bonus_percentage: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ParkingCreated {
    pub parking_id: i64,
}

/// Final wizard step
pub async fn parking_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ParkingRequest>,
) -> ApiResult<ParkingCreated> {
    let property_id = require_property_id(body.property_id)?;

    let parking_id = state
        .store
        .insert_parking(NewParkingRequirement {
            property_id,
            parking_spaces: body.parking_spaces,
            eligible_for_bonus: body.eligible_for_bonus,
            bonus_type: body.bonus_type,
            bonus_percentage: body.bonus_percentage,
        })
        .await?;

    Ok(ApiResponse::success(ParkingCreated { parking_id }))
}
