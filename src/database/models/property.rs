use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use std::collections::HashMap;

use crate::api::input;
use crate::services::wizard::WizardStep;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Property {
    pub property_id: i64,
    pub address: Option<String>,
    pub apn: Option<String>,
    pub pincode: Option<String>,
    pub zoning: Option<String>,
    pub plot_area_sqft: Option<f64>,
    pub height_limit_ft: Option<f64>,
    pub depth_ft: Option<f64>,
    pub width_ft: Option<f64>,
    pub building_sqft: Option<f64>,
    pub usable_sqft: Option<f64>,
    pub parking_spaces: Option<i32>,
    pub garages: Option<i32>,
    #[sqlx(try_from = "String")]
    pub wizard_step: WizardStep,
}

pub const PROPERTY_COLUMNS: &str = "property_id, address, apn, pincode, zoning, plot_area_sqft, \
    height_limit_ft, depth_ft, width_ft, building_sqft, usable_sqft, parking_spaces, garages, wizard_step";

/// Body of `POST /api/properties`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProperty {
    #[serde(default, deserialize_with = "input::opt_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "input::opt_string")]
    pub apn: Option<String>,
    #[serde(default, deserialize_with = "input::opt_string")]
    pub pincode: Option<String>,
    #[serde(default, deserialize_with = "input::opt_string")]
    pub zoning: Option<String>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub plot_area_sqft: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub height_limit_ft: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub depth_ft: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub width_ft: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_f64")]
    pub building_sqft: Option<f64>,
    #[serde(default, alias = "UsableSqrft", deserialize_with = "input::opt_f64")]
    pub usable_sqft: Option<f64>,
    #[serde(default, deserialize_with = "input::opt_i32")]
    pub parking_spaces: Option<i32>,
    #[serde(default, deserialize_with = "input::opt_i32")]
    pub garages: Option<i32>,
}

/// Columns `PATCH /property_update/:id` may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchField {
    Address,
    Apn,
    Pincode,
    Zoning,
    PlotAreaSqft,
    HeightLimitFt,
    DepthFt,
    WidthFt,
    BuildingSqft,
    ParkingSpaces,
    Garages,
    UsableSqft,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue {
    Text(Option<String>),
    Real(Option<f64>),
    Integer(Option<i32>),
}

impl PatchField {
    pub const ALL: [PatchField; 12] = [
        PatchField::Address,
        PatchField::Apn,
        PatchField::Pincode,
        PatchField::Zoning,
        PatchField::PlotAreaSqft,
        PatchField::HeightLimitFt,
        PatchField::DepthFt,
        PatchField::WidthFt,
        PatchField::BuildingSqft,
        PatchField::ParkingSpaces,
        PatchField::Garages,
        PatchField::UsableSqft,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            PatchField::Address => "address",
            PatchField::Apn => "apn",
            PatchField::Pincode => "pincode",
            PatchField::Zoning => "zoning",
            PatchField::PlotAreaSqft => "plot_area_sqft",
            PatchField::HeightLimitFt => "height_limit_ft",
            PatchField::DepthFt => "depth_ft",
            PatchField::WidthFt => "width_ft",
            PatchField::BuildingSqft => "building_sqft",
            PatchField::ParkingSpaces => "parking_spaces",
            PatchField::Garages => "garages",
            PatchField::UsableSqft => "usable_sqft",
        }
    }

    /// JSON keys accepted for this column; the edit form still sends `UsableSqrft`
    fn keys(&self) -> &'static [&'static str] {
        match self {
            PatchField::Address => &["address"],
            PatchField::Apn => &["apn"],
            PatchField::Pincode => &["pincode"],
            PatchField::Zoning => &["zoning"],
            PatchField::PlotAreaSqft => &["plot_area_sqft"],
            PatchField::HeightLimitFt => &["height_limit_ft"],
            PatchField::DepthFt => &["depth_ft"],
            PatchField::WidthFt => &["width_ft"],
            PatchField::BuildingSqft => &["building_sqft"],
            PatchField::ParkingSpaces => &["parking_spaces"],
            PatchField::Garages => &["garages"],
            PatchField::UsableSqft => &["usable_sqft", "UsableSqrft"],
        }
    }

    fn parse(&self, value: &Value) -> Result<PatchValue, String> {
        match self {
            PatchField::Address | PatchField::Apn | PatchField::Pincode | PatchField::Zoning => {
                input::text_from_value(value).map(PatchValue::Text)
            }
            PatchField::ParkingSpaces | PatchField::Garages => {
                input::small_integer_from_value(value).map(PatchValue::Integer)
            }
            _ => input::number_from_value(value).map(PatchValue::Real),
        }
    }
}

/// A validated partial update. Unknown keys in the request body are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyPatch {
    pub fields: Vec<(PatchField, PatchValue)>,
}

impl PropertyPatch {
    pub fn from_json(body: &Map<String, Value>) -> Result<Self, HashMap<String, String>> {
        let mut fields = Vec::new();
        let mut errors = HashMap::new();

        for field in PatchField::ALL {
            let Some((key, value)) = field
                .keys()
                .iter()
                .find_map(|key| body.get(*key).map(|value| (*key, value)))
            else {
                continue;
            };

            match field.parse(value) {
                Ok(parsed) => fields.push((field, parsed)),
                Err(problem) => {
                    errors.insert(key.to_string(), problem);
                }
            }
        }

        if errors.is_empty() {
            Ok(Self { fields })
        } else {
            Err(errors)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Apply to an in-memory row
    pub fn apply_to(&self, property: &mut Property) {
        for (field, value) in &self.fields {
            match (field, value.clone()) {
                (PatchField::Address, PatchValue::Text(v)) => property.address = v,
                (PatchField::Apn, PatchValue::Text(v)) => property.apn = v,
                (PatchField::Pincode, PatchValue::Text(v)) => property.pincode = v,
                (PatchField::Zoning, PatchValue::Text(v)) => property.zoning = v,
                (PatchField::PlotAreaSqft, PatchValue::Real(v)) => property.plot_area_sqft = v,
                (PatchField::HeightLimitFt, PatchValue::Real(v)) => property.height_limit_ft = v,
                (PatchField::DepthFt, PatchValue::Real(v)) => property.depth_ft = v,
                (PatchField::WidthFt, PatchValue::Real(v)) => property.width_ft = v,
                (PatchField::BuildingSqft, PatchValue::Real(v)) => property.building_sqft = v,
                (PatchField::UsableSqft, PatchValue::Real(v)) => property.usable_sqft = v,
                (PatchField::ParkingSpaces, PatchValue::Integer(v)) => property.parking_spaces = v,
                (PatchField::Garages, PatchValue::Integer(v)) => property.garages = v,
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn ignores_unknown_keys() {
        let patch = PropertyPatch::from_json(&body(json!({ "property_id": 9, "owner": "x" }))).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn parses_whitelisted_fields_by_column_kind() {
        let patch = PropertyPatch::from_json(&body(json!({
            "address": "2 Main St",
            "plot_area_sqft": "5200",
            "garages": 2,
            "UsableSqrft": 1800
        })))
        .unwrap();

        assert!(patch.fields.contains(&(PatchField::Address, PatchValue::Text(Some("2 Main St".into())))));
        assert!(patch.fields.contains(&(PatchField::PlotAreaSqft, PatchValue::Real(Some(5200.0)))));
        assert!(patch.fields.contains(&(PatchField::Garages, PatchValue::Integer(Some(2)))));
        assert!(patch.fields.contains(&(PatchField::UsableSqft, PatchValue::Real(Some(1800.0)))));
    }

    #[test]
    fn reports_type_mismatches_per_field() {
        let errors = PropertyPatch::from_json(&body(json!({
            "height_limit_ft": "tall",
            "garages": 1.5
        })))
        .unwrap_err();

        assert!(errors.contains_key("height_limit_ft"));
        assert!(errors.contains_key("garages"));
    }

    #[test]
    fn empty_string_clears_a_column() {
        let patch = PropertyPatch::from_json(&body(json!({ "depth_ft": "" }))).unwrap();
        assert_eq!(patch.fields, vec![(PatchField::DepthFt, PatchValue::Real(None))]);
    }
}
