pub mod aggregate;
pub mod input;
pub mod json;

pub use aggregate::{aggregate_property, PropertyDetail};
pub use json::ApiJson;
