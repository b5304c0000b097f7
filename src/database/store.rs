//! Datastore seams used by the handlers. `MySqlStore` backs production,
//! `MemoryStore` backs tests and `STORAGE_BACKEND=memory` runs.

use async_trait::async_trait;
use std::collections::HashSet;

use super::manager::DatabaseError;
use super::models::{
    NewParkingRequirement, NewPermittedUse, NewProperty, NewSetback, NewUnitDetail,
    NewUploadedFile, NewUser, Property, PropertyJoinRow, PropertyPatch, UnitKind, UploadedFile,
    User, UserUpdate, ZoningRule,
};
use crate::services::wizard::WizardStep;

#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Insert a property at the first wizard step, returning its id
    async fn create_property(&self, property: NewProperty) -> Result<i64, DatabaseError>;

    /// Joined rows for one property, ordered by dependent id. Empty when the
    /// property does not exist.
    async fn property_rows(&self, property_id: i64) -> Result<Vec<PropertyJoinRow>, DatabaseError>;

    /// `NotFound` when no such property exists
    async fn update_property(&self, property_id: i64, patch: &PropertyPatch) -> Result<(), DatabaseError>;

    /// Case-insensitive substring match on address, APN or pincode
    async fn search_properties(&self, query: &str) -> Result<Vec<Property>, DatabaseError>;

    async fn wizard_step(&self, property_id: i64) -> Result<WizardStep, DatabaseError>;

    async fn insert_setback(&self, setback: NewSetback) -> Result<i64, DatabaseError>;

    /// All rows or none
    async fn insert_permitted_uses(
        &self,
        property_id: i64,
        uses: Vec<NewPermittedUse>,
    ) -> Result<Vec<i64>, DatabaseError>;

    /// All rows or none
    async fn insert_unit_details(
        &self,
        kind: UnitKind,
        property_id: i64,
        units: Vec<NewUnitDetail>,
    ) -> Result<Vec<i64>, DatabaseError>;

    async fn insert_parking(&self, parking: NewParkingRequirement) -> Result<i64, DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `Conflict` when the email is already registered
    async fn create_user(&self, user: NewUser) -> Result<i64, DatabaseError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError>;
    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;
    async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<User, DatabaseError>;
    async fn delete_user(&self, id: i64) -> Result<(), DatabaseError>;
    async fn set_password(&self, id: i64, password_hash: &str) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait ZoningStore: Send + Sync {
    async fn list_zones(&self) -> Result<Vec<ZoningRule>, DatabaseError>;

    /// Exact zone code, optional substring filter on city
    async fn zones_by_code(
        &self,
        zone_code: &str,
        city: Option<&str>,
    ) -> Result<Vec<ZoningRule>, DatabaseError>;

    async fn zone(&self, id: i64) -> Result<Option<ZoningRule>, DatabaseError>;
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn record_file(&self, file: NewUploadedFile) -> Result<UploadedFile, DatabaseError>;

    /// Newest first
    async fn list_files(&self) -> Result<Vec<UploadedFile>, DatabaseError>;

    /// Substring match on the original filename, newest first
    async fn search_files(&self, filename: &str) -> Result<Vec<UploadedFile>, DatabaseError>;

    /// Returns the removed row
    async fn delete_file(&self, id: i64) -> Result<UploadedFile, DatabaseError>;
}

#[async_trait]
pub trait Store: PropertyStore + UserStore + ZoningStore + FileStore {
    async fn ping(&self) -> Result<(), DatabaseError>;
}

pub(crate) fn property_not_found() -> DatabaseError {
    DatabaseError::NotFound("Property not found.".to_string())
}

/// Type keys must be unique per property: within the submitted payload and
/// against rows already stored.
pub(crate) fn check_type_keys<'a>(
    label: &str,
    incoming: impl IntoIterator<Item = &'a str>,
    stored: &[String],
) -> Result<(), DatabaseError> {
    let mut seen = HashSet::new();
    for key in incoming {
        if !seen.insert(key) {
            return Err(DatabaseError::Validation(format!(
                "Duplicate {} type '{}' in request",
                label, key
            )));
        }
        if stored.iter().any(|existing| existing == key) {
            return Err(DatabaseError::Conflict(format!(
                "{} type '{}' already exists for this property",
                label, key
            )));
        }
    }
    Ok(())
}

/// Setbacks and parking hold at most one row per property
pub(crate) fn check_single_row(label: &str, existing: i64) -> Result<(), DatabaseError> {
    if existing > 0 {
        return Err(DatabaseError::Conflict(format!(
            "{} already recorded for this property",
            label
        )));
    }
    Ok(())
}

/// Escape `%`, `_` and `\` so user input matches literally inside LIKE
pub(crate) fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_in_payload_is_a_validation_error() {
        let err = check_type_keys("permitted use", ["Garage", "Garage"], &[]).unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[test]
    fn duplicate_against_stored_is_a_conflict() {
        let stored = vec!["Detached".to_string()];
        let err = check_type_keys("ADU", ["Attached", "Detached"], &stored).unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[test]
    fn distinct_keys_pass() {
        assert!(check_type_keys("JADU", ["A", "B"], &["C".to_string()]).is_ok());
    }

    #[test]
    fn second_single_row_is_a_conflict() {
        assert!(check_single_row("Setbacks", 0).is_ok());
        assert!(matches!(check_single_row("Setbacks", 1), Err(DatabaseError::Conflict(_))));
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Main St"), "Main St");
    }
}
