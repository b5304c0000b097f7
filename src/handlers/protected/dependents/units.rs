// handlers/protected/dependents/units.rs - ADU and JADU submissions
//
// POST /api/adu-details  { aduDetails: [...] }
// POST /api/jadu-details { jaduDetails: [...] }

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::require_property_id;
use crate::api::{input, ApiJson};
use crate::app::AppState;
use crate::database::models::{NewUnitDetail, UnitKind};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AduDetailsRequest {
    #[serde(default)]
    pub adu_details: Vec<AduInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JaduDetailsRequest {
    #[serde(default)]
    pub jadu_details: Vec<JaduInput>,
}

/// Columns shared by both unit tables
#[derive(Debug, Deserialize)]
pub struct UnitDimensions {
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub length: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub breadth: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub setbacks_front_back: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub side_yards: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_i32")]
    pub no_of_units: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AduInput {
    #[serde(default, deserialize_with = "input::opt_i64")]
    pub property_id: Option<i64>,
    #[serde(default, deserialize_with = "input::opt_string")]
    pub adu_type: Option<String>,
    #[serde(default, deserialize_with = "input::opt_i32")]
    pub adu_count: Option<i32>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub adu_max_sqft: Option<f64>,
    #[serde(flatten)]
    pub dimensions: UnitDimensions,
}

#[derive(Debug, Deserialize)]
pub struct JaduInput {
    #[serde(default, deserialize_with = "input::opt_i64")]
    pub property_id: Option<i64>,
    #[serde(default, deserialize_with = "input::opt_string")]
    pub jadu_type: Option<String>,
    #[serde(default, deserialize_with = "input::opt_i32")]
    pub jadu_count: Option<i32>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub jadu_max_sqft: Option<f64>,
    #[serde(flatten)]
    pub dimensions: UnitDimensions,
}

/// One submitted row before validation
struct UnitRow {
    property_id: Option<i64>,
    unit_type: Option<String>,
    unit_count: Option<i32>,
    max_sqft: Option<f64>,
    dimensions: UnitDimensions,
}

impl From<AduInput> for UnitRow {
    fn from(row: AduInput) -> Self {
        Self {
            property_id: row.property_id,
            unit_type: row.adu_type,
            unit_count: row.adu_count,
            max_sqft: row.adu_max_sqft,
            dimensions: row.dimensions,
        }
    }
}

impl From<JaduInput> for UnitRow {
    fn from(row: JaduInput) -> Self {
        Self {
            property_id: row.property_id,
            unit_type: row.jadu_type,
            unit_count: row.jadu_count,
            max_sqft: row.jadu_max_sqft,
            dimensions: row.dimensions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UnitsCreated {
    pub message: String,
    #[serde(rename = "affectedRows")]
    pub affected_rows: usize,
    pub ids: Vec<i64>,
}

pub async fn adu_details_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AduDetailsRequest>,
) -> ApiResult<UnitsCreated> {
    let rows = body.adu_details.into_iter().map(UnitRow::from).collect();
    submit_units(&state, UnitKind::Adu, "aduDetails", rows).await
}

pub async fn jadu_details_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<JaduDetailsRequest>,
) -> ApiResult<UnitsCreated> {
    let rows = body.jadu_details.into_iter().map(UnitRow::from).collect();
    submit_units(&state, UnitKind::Jadu, "jaduDetails", rows).await
}

async fn submit_units(
    state: &AppState,
    kind: UnitKind,
    field: &str,
    rows: Vec<UnitRow>,
) -> ApiResult<UnitsCreated> {
    let (property_id, units) = validate_rows(kind, field, rows)?;

    let ids = state.store.insert_unit_details(kind, property_id, units).await?;
    info!("Added {} {} row(s) to property {}", ids.len(), kind.label(), property_id);

    Ok(ApiResponse::success(UnitsCreated {
        message: format!("{} details inserted successfully.", kind.label()),
        affected_rows: ids.len(),
        ids,
    }))
}

/// Every row must name the same property and carry a type
fn validate_rows(
    kind: UnitKind,
    field: &str,
    rows: Vec<UnitRow>,
) -> Result<(i64, Vec<NewUnitDetail>), ApiError> {
    if rows.is_empty() {
        return Err(ApiError::bad_request(format!(
            "Invalid input: {} should be a non-empty array.",
            field
        )));
    }

    let mut property_id = None;
    let mut units = Vec::with_capacity(rows.len());

    for row in rows {
        let row_property = require_property_id(row.property_id)?;
        match property_id {
            None => property_id = Some(row_property),
            Some(existing) if existing != row_property => {
                return Err(ApiError::bad_request(format!(
                    "All {} rows must belong to the same property",
                    kind.label()
                )));
            }
            Some(_) => {}
        }

        let unit_type = row.unit_type.ok_or_else(|| {
            ApiError::invalid_field(format!("{}_type", kind.prefix()), "Type is required")
        })?;

        units.push(NewUnitDetail {
            unit_type,
            unit_count: row.unit_count,
            max_sqft: row.max_sqft,
            height: row.dimensions.height,
            length: row.dimensions.length,
            breadth: row.dimensions.breadth,
            setbacks_front_back: row.dimensions.setbacks_front_back,
            side_yards: row.dimensions.side_yards,
            no_of_units: row.dimensions.no_of_units,
        });
    }

    // Non-empty input always sets it
    let property_id = property_id.ok_or_else(|| ApiError::bad_request("property_id is required"))?;
    Ok((property_id, units))
}
