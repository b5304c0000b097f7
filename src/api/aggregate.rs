//! Reshape the flat property detail join into one nested record.
//!
//! The join expands across three independent one-to-many relations, so a
//! property with 2 permitted uses, 3 ADU types and 1 JADU type yields 6 rows.
//! Each relation is recovered by its own pass over the full row set, keyed by
//! its type column. A key seen earlier wins: later rows with the same key add
//! nothing, even when their other columns differ. Such collisions are logged.

use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::warn;

use crate::database::models::PropertyJoinRow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermittedUseEntry {
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

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AduEntry {
    pub adu_type: String,
    pub adu_count: Option<i32>,
    pub adu_max_sqft: Option<f64>,
    pub height: Option<f64>,
    pub length: Option<f64>,
    pub breadth: Option<f64>,
    pub setbacks_front_back: Option<f64>,
    pub side_yards: Option<f64>,
    pub no_of_units: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JaduEntry {
    pub jadu_type: String,
    pub jadu_count: Option<i32>,
    pub jadu_max_sqft: Option<f64>,
    pub height: Option<f64>,
    pub length: Option<f64>,
    pub breadth: Option<f64>,
    pub setbacks_front_back: Option<f64>,
    pub side_yards: Option<f64>,
    pub no_of_units: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParkingEntry {
    pub parking_spaces: Option<i32>,
    pub eligible_for_bonus: Option<bool>,
    pub bonus_type: Option<String>,
    pub bonus_percentage: Option<f64>,
}

/// Response of `GET /api/property/:id`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDetail {
    pub property_id: i64,
    pub address: Option<String>,
    pub apn: Option<String>,
    pub zoning: Option<String>,
    pub plot_area_sqft: Option<f64>,
    pub pincode: Option<String>,
    pub height_limit_ft: Option<f64>,
    pub depth_ft: Option<f64>,
    pub width_ft: Option<f64>,
    pub building_sqft: Option<f64>,
    pub usable_sqft: Option<f64>,
    pub front_ft: Option<f64>,
    pub back_ft: Option<f64>,
    pub side_ft: Option<f64>,
    pub permitted_uses: BTreeMap<String, PermittedUseEntry>,
    pub adu_details: BTreeMap<String, AduEntry>,
    pub jadu_details: BTreeMap<String, JaduEntry>,
    pub parking_requirement: Option<ParkingEntry>,
    pub parking_spaces: Option<i32>,
    pub garages: Option<i32>,
}

/// Build the nested record. `None` when there are no rows, i.e. no property.
pub fn aggregate_property(rows: &[PropertyJoinRow]) -> Option<PropertyDetail> {
    let first = rows.first()?;

    Some(PropertyDetail {
        property_id: first.property_id,
        address: first.address.clone(),
        apn: first.apn.clone(),
        zoning: first.zoning.clone(),
        plot_area_sqft: first.plot_area_sqft,
        pincode: first.pincode.clone(),
        height_limit_ft: first.height_limit_ft,
        depth_ft: first.depth_ft,
        width_ft: first.width_ft,
        building_sqft: first.building_sqft,
        usable_sqft: first.usable_sqft,
        front_ft: first.front_ft,
        back_ft: first.back_ft,
        side_ft: first.side_ft,
        permitted_uses: group_first_by_key(rows, "permitted use", permitted_use_entry),
        adu_details: group_first_by_key(rows, "ADU", adu_entry),
        jadu_details: group_first_by_key(rows, "JADU", jadu_entry),
        parking_requirement: rows.iter().find_map(parking_entry),
        parking_spaces: first.parking_spaces,
        garages: first.garages,
    })
}

/// One pass over every row; `extract` yields `None` when the row has no
/// match for this relation.
fn group_first_by_key<T, F>(rows: &[PropertyJoinRow], relation: &str, extract: F) -> BTreeMap<String, T>
where
    T: PartialEq,
    F: Fn(&PropertyJoinRow) -> Option<(String, T)>,
{
    let mut grouped = BTreeMap::new();

    for row in rows {
        let Some((key, entry)) = extract(row) else {
            continue;
        };

        match grouped.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            Entry::Occupied(existing) => {
                if *existing.get() != entry {
                    warn!(
                        property_id = row.property_id,
                        key = %existing.key(),
                        "Duplicate {} type with differing values; keeping the first occurrence",
                        relation
                    );
                }
            }
        }
    }

    grouped
}

fn permitted_use_entry(row: &PropertyJoinRow) -> Option<(String, PermittedUseEntry)> {
    let use_type = row.use_type.clone()?;
    Some((
        use_type.clone(),
        PermittedUseEntry {
            use_type,
            lot_area_sqft: row.lot_area_sqft,
            lot_width_ft: row.lot_width_ft,
            lot_depth_ft: row.lot_depth_ft,
            setback_front_ft: row.setback_front_ft,
            setback_back_ft: row.setback_back_ft,
            setback_side_ft: row.setback_side_ft,
            max_height_ft: row.max_height_ft,
            parking_spaces_required: row.parking_spaces_required,
        },
    ))
}

fn adu_entry(row: &PropertyJoinRow) -> Option<(String, AduEntry)> {
    let adu_type = row.adu_type.clone()?;
    Some((
        adu_type.clone(),
        AduEntry {
            adu_type,
            adu_count: row.adu_count,
            adu_max_sqft: row.adu_max_sqft,
            height: row.adu_height,
            length: row.adu_length,
            breadth: row.adu_breadth,
            setbacks_front_back: row.adu_setbacks_front_back,
            side_yards: row.adu_side_yards,
            no_of_units: row.adu_no_of_units,
        },
    ))
}

fn jadu_entry(row: &PropertyJoinRow) -> Option<(String, JaduEntry)> {
    let jadu_type = row.jadu_type.clone()?;
    Some((
        jadu_type.clone(),
        JaduEntry {
            jadu_type,
            jadu_count: row.jadu_count,
            jadu_max_sqft: row.jadu_max_sqft,
            height: row.jadu_height,
            length: row.jadu_length,
            breadth: row.jadu_breadth,
            setbacks_front_back: row.jadu_setbacks_front_back,
            side_yards: row.jadu_side_yards,
            no_of_units: row.jadu_no_of_units,
        },
    ))
}

fn parking_entry(row: &PropertyJoinRow) -> Option<ParkingEntry> {
    row.parking_id?;
    Some(ParkingEntry {
        parking_spaces: row.required_parking_spaces,
        eligible_for_bonus: row.eligible_for_bonus,
        bonus_type: row.bonus_type.clone(),
        bonus_percentage: row.bonus_percentage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_row() -> PropertyJoinRow {
        PropertyJoinRow {
            property_id: 1,
            address: Some("1 Main St".into()),
            apn: Some("APN1".into()),
            pincode: Some("94103".into()),
            zoning: Some("R1".into()),
            plot_area_sqft: Some(5000.0),
            height_limit_ft: Some(30.0),
            depth_ft: Some(100.0),
            width_ft: Some(50.0),
            building_sqft: Some(2000.0),
            ..Default::default()
        }
    }

    /// Cartesian expansion the way the LEFT JOIN produces it
    fn joined(uses: &[(&str, f64)], adus: &[(&str, i32)], jadus: &[(&str, i32)]) -> Vec<PropertyJoinRow> {
        let pad = |n: usize| if n == 0 { 1 } else { n };
        let mut rows = Vec::new();
        for u in 0..pad(uses.len()) {
            for a in 0..pad(adus.len()) {
                for j in 0..pad(jadus.len()) {
                    let mut row = base_row();
                    if let Some((use_type, lot)) = uses.get(u) {
                        row.use_type = Some(use_type.to_string());
                        row.lot_area_sqft = Some(*lot);
                    }
                    if let Some((adu_type, count)) = adus.get(a) {
                        row.adu_type = Some(adu_type.to_string());
                        row.adu_count = Some(*count);
                    }
                    if let Some((jadu_type, count)) = jadus.get(j) {
                        row.jadu_type = Some(jadu_type.to_string());
                        row.jadu_count = Some(*count);
                    }
                    rows.push(row);
                }
            }
        }
        rows
    }

    #[test]
    fn empty_input_is_not_found() {
        assert!(aggregate_property(&[]).is_none());
    }

    #[test]
    fn property_without_dependents_has_empty_maps() {
        let detail = aggregate_property(&[base_row()]).unwrap();
        assert!(detail.permitted_uses.is_empty());
        assert!(detail.adu_details.is_empty());
        assert!(detail.jadu_details.is_empty());
        assert!(detail.parking_requirement.is_none());

        let body = serde_json::to_value(&detail).unwrap();
        assert_eq!(body["permitted_uses"], json!({}));
        assert_eq!(body["adu_details"], json!({}));
        assert_eq!(body["jadu_details"], json!({}));
        assert_eq!(body["address"], "1 Main St");
    }

    #[test]
    fn cartesian_rows_recover_each_relation_independently() {
        let rows = joined(
            &[("Single-Family", 5000.0), ("Garage", 400.0)],
            &[("Attached", 1), ("Detached", 2), ("Conversion", 1)],
            &[("Interior", 1)],
        );
        assert_eq!(rows.len(), 6);

        let detail = aggregate_property(&rows).unwrap();
        assert_eq!(detail.permitted_uses.len(), 2);
        assert_eq!(detail.adu_details.len(), 3);
        assert_eq!(detail.jadu_details.len(), 1);
        assert_eq!(detail.adu_details["Detached"].adu_count, Some(2));
        assert_eq!(detail.permitted_uses["Garage"].lot_area_sqft, Some(400.0));
    }

    #[test]
    fn map_sizes_match_distinct_keys_for_many_shapes() {
        for (u, a, j) in [(0, 0, 0), (1, 0, 0), (0, 3, 0), (2, 2, 2), (4, 1, 3)] {
            let uses: Vec<(String, f64)> = (0..u).map(|i| (format!("use-{i}"), i as f64)).collect();
            let adus: Vec<(String, i32)> = (0..a).map(|i| (format!("adu-{i}"), i)).collect();
            let jadus: Vec<(String, i32)> = (0..j).map(|i| (format!("jadu-{i}"), i)).collect();
            let uses: Vec<(&str, f64)> = uses.iter().map(|(k, v)| (k.as_str(), *v)).collect();
            let adus: Vec<(&str, i32)> = adus.iter().map(|(k, v)| (k.as_str(), *v)).collect();
            let jadus: Vec<(&str, i32)> = jadus.iter().map(|(k, v)| (k.as_str(), *v)).collect();

            let detail = aggregate_property(&joined(&uses, &adus, &jadus)).unwrap();
            assert_eq!(detail.permitted_uses.len(), u);
            assert_eq!(detail.adu_details.len(), a as usize);
            assert_eq!(detail.jadu_details.len(), j as usize);
        }
    }

    #[test]
    fn row_order_does_not_change_unique_keyed_output() {
        let rows = joined(
            &[("Single-Family", 5000.0), ("Garage", 400.0)],
            &[("Attached", 1), ("Detached", 2)],
            &[("Interior", 1)],
        );
        let mut reversed = rows.clone();
        reversed.reverse();

        assert_eq!(aggregate_property(&rows), aggregate_property(&reversed));
    }

    #[test]
    fn duplicate_use_type_keeps_first_occurrence() {
        let mut first = base_row();
        first.use_type = Some("Single-Family".into());
        first.lot_area_sqft = Some(5000.0);

        let mut second = base_row();
        second.use_type = Some("Single-Family".into());
        second.lot_area_sqft = Some(9999.0);

        let detail = aggregate_property(&[first.clone(), second.clone()]).unwrap();
        assert_eq!(detail.permitted_uses.len(), 1);
        assert_eq!(detail.permitted_uses["Single-Family"].lot_area_sqft, Some(5000.0));

        // Swapping the input order swaps the winner
        let detail = aggregate_property(&[second, first]).unwrap();
        assert_eq!(detail.permitted_uses["Single-Family"].lot_area_sqft, Some(9999.0));
    }

    #[test]
    fn parking_requirement_comes_from_first_matching_row() {
        let mut row = base_row();
        row.parking_id = Some(3);
        row.required_parking_spaces = Some(2);
        row.eligible_for_bonus = Some(true);
        row.bonus_type = Some("Density".into());
        row.bonus_percentage = Some(35.0);

        let detail = aggregate_property(&[row]).unwrap();
        let parking = detail.parking_requirement.unwrap();
        assert_eq!(parking.parking_spaces, Some(2));
        assert_eq!(parking.bonus_percentage, Some(35.0));
    }
}
