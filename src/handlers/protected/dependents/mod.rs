// handlers/protected/dependents/mod.rs - rows that hang off a property
//
// Each submission is checked against the property's wizard step and written
// in one transaction by the store.

pub mod parking;
pub mod permitted_uses;
pub mod setbacks;
pub mod units;

pub use parking::parking_post;
pub use permitted_uses::permitted_uses_post;
pub use setbacks::setbacks_post;
pub use units::{adu_details_post, jadu_details_post};

use crate::error::ApiError;

pub(crate) fn require_property_id(property_id: Option<i64>) -> Result<i64, ApiError> {
    property_id
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::invalid_field("property_id", "property_id is required"))
}
