// handlers/public/zoning.rs - read-only zoning reference lookups

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::ZoningRule;
use crate::error::ApiError;
use crate::handlers::path_id;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    pub city: Option<String>,
}

/// GET /zones - every rule, 404 when the table is empty
pub async fn zones_get(State(state): State<AppState>) -> ApiResult<Vec<ZoningRule>> {
    let rules = state.store.list_zones().await?;
    if rules.is_empty() {
        return Err(ApiError::not_found("No zoning rules found"));
    }
    Ok(ApiResponse::success(rules))
}

/// GET /zones/:zone_code?city= - rules for one code, optionally narrowed by city
pub async fn zones_by_code_get(
    State(state): State<AppState>,
    Path(zone_code): Path<String>,
    Query(query): Query<CityQuery>,
) -> ApiResult<Vec<ZoningRule>> {
    let zone_code = zone_code.trim();
    if zone_code.is_empty() {
        return Err(ApiError::bad_request("Invalid zone code"));
    }

    let city = query.city.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let rules = state.store.zones_by_code(zone_code, city).await?;
    if rules.is_empty() {
        return Err(ApiError::not_found("No zoning rules found for this zone code"));
    }
    Ok(ApiResponse::success(rules))
}

/// GET /zone/:id
pub async fn zone_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ZoningRule> {
    let id = path_id(&id)?;
    let rule = state
        .store
        .zone(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Zone not found"))?;
    Ok(ApiResponse::success(rule))
}
