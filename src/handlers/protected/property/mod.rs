// handlers/protected/property/mod.rs - property records

pub mod create;
pub mod detail;
pub mod search;
pub mod update;
pub mod wizard;

pub use create::property_post;
pub use detail::property_get;
pub use search::search_get;
pub use update::property_patch;
pub use wizard::wizard_get;
