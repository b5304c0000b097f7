use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Zoning reference data, read-only through the API
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct ZoningRule {
    pub id: i64,
    pub zone_code: String,
    pub city: Option<String>,
    pub use_name: Option<String>,
    pub use_type: Option<String>,
    pub min_lot_size: Option<f64>,
    pub front_setback: Option<f64>,
    pub side_setback: Option<f64>,
    pub rear_setback: Option<f64>,
    pub max_height: Option<f64>,
    pub max_units: Option<i32>,
    pub required_parking_spaces: Option<i32>,
    pub parking_type: Option<String>,
    pub parking_dimensions: Option<String>,
    pub condition_type: Option<String>,
    pub condition_description: Option<String>,
    pub additional_notes: Option<String>,
}

pub const ZONING_RULE_COLUMNS: &str = "id, zone_code, city, use_name, use_type, min_lot_size, \
    front_setback, side_setback, rear_setback, max_height, max_units, required_parking_spaces, \
    parking_type, parking_dimensions, condition_type, condition_description, additional_notes";
