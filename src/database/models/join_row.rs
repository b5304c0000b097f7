use sqlx::FromRow;

/// One row of the property detail LEFT JOIN.
///
/// Property and setback columns repeat on every row; each row carries at most
/// one permitted use, one ADU and one JADU, NULL-filled when the relation has
/// no match. Columns that collide across tables are aliased with a prefix.
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct PropertyJoinRow {
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

    pub front_ft: Option<f64>,
    pub back_ft: Option<f64>,
    pub side_ft: Option<f64>,

    pub use_type: Option<String>,
    pub lot_area_sqft: Option<f64>,
    pub lot_width_ft: Option<f64>,
    pub lot_depth_ft: Option<f64>,
    pub setback_front_ft: Option<f64>,
    pub setback_back_ft: Option<f64>,
    pub setback_side_ft: Option<f64>,
    pub max_height_ft: Option<f64>,
    pub parking_spaces_required: Option<i32>,

    pub adu_type: Option<String>,
    pub adu_count: Option<i32>,
    pub adu_max_sqft: Option<f64>,
    pub adu_height: Option<f64>,
    pub adu_length: Option<f64>,
    pub adu_breadth: Option<f64>,
    pub adu_setbacks_front_back: Option<f64>,
    pub adu_side_yards: Option<f64>,
    pub adu_no_of_units: Option<i32>,

    pub jadu_type: Option<String>,
    pub jadu_count: Option<i32>,
    pub jadu_max_sqft: Option<f64>,
    pub jadu_height: Option<f64>,
    pub jadu_length: Option<f64>,
    pub jadu_breadth: Option<f64>,
    pub jadu_setbacks_front_back: Option<f64>,
    pub jadu_side_yards: Option<f64>,
    pub jadu_no_of_units: Option<i32>,

    pub parking_id: Option<i64>,
    pub required_parking_spaces: Option<i32>,
    pub eligible_for_bonus: Option<bool>,
    pub bonus_type: Option<String>,
    pub bonus_percentage: Option<f64>,
}

/// Ordered by child ids so "first occurrence" means "earliest inserted".
pub const PROPERTY_DETAIL_QUERY: &str = r#"
    SELECT
        p.property_id, p.address, p.apn, p.pincode, p.zoning,
        p.plot_area_sqft, p.height_limit_ft, p.depth_ft, p.width_ft,
        p.building_sqft, p.usable_sqft, p.parking_spaces, p.garages,
        s.front_ft, s.back_ft, s.side_ft,
        u.use_type, u.lot_area_sqft, u.lot_width_ft, u.lot_depth_ft,
        u.setback_front_ft, u.setback_back_ft, u.setback_side_ft,
        u.max_height_ft, u.parking_spaces_required,
        a.adu_type, a.adu_count, a.adu_max_sqft,
        a.height AS adu_height, a.length AS adu_length, a.breadth AS adu_breadth,
        a.setbacks_front_back AS adu_setbacks_front_back,
        a.side_yards AS adu_side_yards, a.no_of_units AS adu_no_of_units,
        j.jadu_type, j.jadu_count, j.jadu_max_sqft,
        j.height AS jadu_height, j.length AS jadu_length, j.breadth AS jadu_breadth,
        j.setbacks_front_back AS jadu_setbacks_front_back,
        j.side_yards AS jadu_side_yards, j.no_of_units AS jadu_no_of_units,
        pr.parking_id, pr.parking_spaces AS required_parking_spaces,
        pr.eligible_for_bonus, pr.bonus_type, pr.bonus_percentage
    FROM properties p
    LEFT JOIN setbacks s ON s.property_id = p.property_id
    LEFT JOIN lot_zoning_details u ON u.property_id = p.property_id
    LEFT JOIN adu_details a ON a.property_id = p.property_id
    LEFT JOIN jadu_details j ON j.property_id = p.property_id
    LEFT JOIN parking_requirements pr ON pr.property_id = p.property_id
    WHERE p.property_id = ?
    ORDER BY s.setback_id, u.use_id, a.adu_id, j.jadu_id, pr.parking_id
"#;
