// Rows that hang off a property through property_id

use serde::Serialize;

use crate::services::wizard::WizardStep;

#[derive(Debug, Clone, Serialize)]
pub struct Setback {
    pub setback_id: i64,
    pub property_id: i64,
    pub front_ft: Option<f64>,
    pub back_ft: Option<f64>,
    pub side_ft: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewSetback {
    pub property_id: i64,
    pub front_ft: Option<f64>,
    pub back_ft: Option<f64>,
    pub side_ft: Option<f64>,
}

/// Stored in `lot_zoning_details`
#[derive(Debug, Clone, Serialize)]
pub struct PermittedUse {
    pub use_id: i64,
    pub property_id: i64,
    #[serde(flatten)]
    pub detail: NewPermittedUse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPermittedUse {
    pub use_type: String,
    pub lot_area_sqft: Option<f64>,
    pub lot_width_ft: Option<f64>,
    pub lot_depth_ft: Option<f64>,
    pub setback_front_ft: Option<f64>,
    pub setback_back_ft: Option<f64>,
    pub setback_side_ft: Option<f64>,
    pub max_height_ft: Option<f64>,
    pub parking_spaces_required: Option<i32>,
}

/// ADU and JADU rows share a shape and differ only in table and column prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Adu,
    Jadu,
}

impl UnitKind {
    pub fn table(&self) -> &'static str {
        match self {
            UnitKind::Adu => "adu_details",
            UnitKind::Jadu => "jadu_details",
        }
    }

    /// Column prefix: `adu_type`, `adu_count`, `adu_max_sqft`
    pub fn prefix(&self) -> &'static str {
        match self {
            UnitKind::Adu => "adu",
            UnitKind::Jadu => "jadu",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UnitKind::Adu => "ADU",
            UnitKind::Jadu => "JADU",
        }
    }

    pub fn wizard_step(&self) -> WizardStep {
        match self {
            UnitKind::Adu => WizardStep::Adu,
            UnitKind::Jadu => WizardStep::Jadu,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnitDetail {
    pub unit_id: i64,
    pub property_id: i64,
    pub detail: NewUnitDetail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUnitDetail {
    pub unit_type: String,
    pub unit_count: Option<i32>,
    pub max_sqft: Option<f64>,
    pub height: Option<f64>,
    pub length: Option<f64>,
    pub breadth: Option<f64>,
    pub setbacks_front_back: Option<f64>,
    pub side_yards: Option<f64>,
    pub no_of_units: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParkingRequirement {
    pub parking_id: i64,
    pub property_id: i64,
    pub parking_spaces: Option<i32>,
    pub eligible_for_bonus: Option<bool>,
    pub bonus_type: Option<String>,
    pub bonus_percentage: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewParkingRequirement {
    pub property_id: i64,
    pub parking_spaces: Option<i32>,
    pub eligible_for_bonus: Option<bool>,
    pub bonus_type: Option<String>,
    pub bonus_percentage: Option<f64>,
}
