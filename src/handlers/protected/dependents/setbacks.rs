// handlers/protected/dependents/setbacks.rs - POST /api/setbacks

use axum::extract::State;
use serde::{Deserialize, Serialize};

use super::require_property_id;
use crate::api::{input, ApiJson};
use crate::app::AppState;
use crate::database::models::NewSetback;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct SetbackRequest {
    #[serde(default, deserialize_with = "input::opt_i64")]
    pub property_id: Option<i64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub front_ft: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub back_ft: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub side_ft: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SetbackCreated {
    pub setback_id: i64,
}

pub async fn setbacks_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SetbackRequest>,
) -> ApiResult<SetbackCreated> {
    let property_id = require_property_id(body.property_id)?;

    let setback_id = state
        .store
        .insert_setback(NewSetback {
            property_id,
            front_ft: body.front_ft,
            back_ft: body.back_ft,
            side_ft: body.side_ft,
        })
        .await?;

    Ok(ApiResponse::success(SetbackCreated { setback_id }))
}
