pub mod dependents;
pub mod file;
pub mod join_row;
pub mod property;
pub mod user;
pub mod zoning;

pub use dependents::{
    NewParkingRequirement, NewPermittedUse, NewSetback, NewUnitDetail, ParkingRequirement,
    PermittedUse, Setback, UnitDetail, UnitKind,
};
pub use file::{NewUploadedFile, UploadedFile};
pub use join_row::PropertyJoinRow;
pub use property::{NewProperty, PatchField, PatchValue, Property, PropertyPatch};
pub use user::{NewUser, User, UserUpdate};
pub use zoning::ZoningRule;
