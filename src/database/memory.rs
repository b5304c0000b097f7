//! In-process store for tests and local runs without MySQL.
//!
//! Writes run against a clone of the tables that replaces the live copy only
//! on success, so a failed multi-row submission leaves nothing behind.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::manager::DatabaseError;
use super::models::{
    NewParkingRequirement, NewPermittedUse, NewProperty, NewSetback, NewUnitDetail,
    NewUploadedFile, NewUser, ParkingRequirement, PermittedUse, Property, PropertyJoinRow,
    PropertyPatch, Setback, UnitDetail, UnitKind, UploadedFile, User, UserUpdate, ZoningRule,
};
use super::store::{
    check_single_row, check_type_keys, property_not_found, FileStore, PropertyStore, Store, UserStore, ZoningStore,
};
use crate::services::wizard::{self, WizardStep};

#[derive(Debug, Clone, Default)]
struct Sequence(i64);

impl Sequence {
    fn next(&mut self) -> i64 {
        self.0 += 1;
        self.0
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    properties: Vec<Property>,
    setbacks: Vec<Setback>,
    permitted_uses: Vec<PermittedUse>,
    adu_details: Vec<UnitDetail>,
    jadu_details: Vec<UnitDetail>,
    parking: Vec<ParkingRequirement>,
    users: Vec<User>,
    zoning_rules: Vec<ZoningRule>,
    files: Vec<UploadedFile>,

    property_ids: Sequence,
    setback_ids: Sequence,
    use_ids: Sequence,
    adu_ids: Sequence,
    jadu_ids: Sequence,
    parking_ids: Sequence,
    user_ids: Sequence,
    file_ids: Sequence,
}

impl Tables {
    fn property_mut(&mut self, property_id: i64) -> Result<&mut Property, DatabaseError> {
        self.properties
            .iter_mut()
            .find(|p| p.property_id == property_id)
            .ok_or_else(property_not_found)
    }

    fn advance_step(&mut self, property_id: i64, requested: WizardStep) -> Result<(), DatabaseError> {
        let property = self.property_mut(property_id)?;
        property.wizard_step = wizard::advance(property.wizard_step, requested)?;
        Ok(())
    }

    fn units(&self, kind: UnitKind) -> &Vec<UnitDetail> {
        match kind {
            UnitKind::Adu => &self.adu_details,
            UnitKind::Jadu => &self.jadu_details,
        }
    }

    fn units_mut(&mut self, kind: UnitKind) -> (&mut Vec<UnitDetail>, &mut Sequence) {
        match kind {
            UnitKind::Adu => (&mut self.adu_details, &mut self.adu_ids),
            UnitKind::Jadu => (&mut self.jadu_details, &mut self.jadu_ids),
        }
    }

    /// Same shape and order as the LEFT JOIN query
    fn join_rows(&self, property_id: i64) -> Vec<PropertyJoinRow> {
        let Some(property) = self.properties.iter().find(|p| p.property_id == property_id) else {
            return Vec::new();
        };

        let setbacks = padded(self.setbacks.iter().filter(|s| s.property_id == property_id));
        let uses = padded(self.permitted_uses.iter().filter(|u| u.property_id == property_id));
        let adus = padded(self.adu_details.iter().filter(|a| a.property_id == property_id));
        let jadus = padded(self.jadu_details.iter().filter(|j| j.property_id == property_id));
        let parking = padded(self.parking.iter().filter(|p| p.property_id == property_id));

        let mut rows = Vec::new();
        for setback in &setbacks {
            for permitted in &uses {
                for adu in &adus {
                    for jadu in &jadus {
                        for requirement in &parking {
                            rows.push(join_row(property, *setback, *permitted, *adu, *jadu, *requirement));
                        }
                    }
                }
            }
        }
        rows
    }
}

/// LEFT JOIN semantics: an empty relation still yields one NULL row
fn padded<'a, T: 'a>(items: impl Iterator<Item = &'a T>) -> Vec<Option<&'a T>> {
    let matched: Vec<Option<&T>> = items.map(Some).collect();
    if matched.is_empty() {
        vec![None]
    } else {
        matched
    }
}

fn join_row(
    property: &Property,
    setback: Option<&Setback>,
    permitted: Option<&PermittedUse>,
    adu: Option<&UnitDetail>,
    jadu: Option<&UnitDetail>,
    parking: Option<&ParkingRequirement>,
) -> PropertyJoinRow {
    let mut row = PropertyJoinRow {
        property_id: property.property_id,
        address: property.address.clone(),
        apn: property.apn.clone(),
        pincode: property.pincode.clone(),
        zoning: property.zoning.clone(),
        plot_area_sqft: property.plot_area_sqft,
        height_limit_ft: property.height_limit_ft,
        depth_ft: property.depth_ft,
        width_ft: property.width_ft,
        building_sqft: property.building_sqft,
        usable_sqft: property.usable_sqft,
        parking_spaces: property.parking_spaces,
        garages: property.garages,
        ..Default::default()
    };

    if let Some(s) = setback {
        row.front_ft = s.front_ft;
        row.back_ft = s.back_ft;
        row.side_ft = s.side_ft;
    }
    if let Some(u) = permitted {
        let d = &u.detail;
        row.use_type = Some(d.use_type.clone());
        row.lot_area_sqft = d.lot_area_sqft;
        row.lot_width_ft = d.lot_width_ft;
        row.lot_depth_ft = d.lot_depth_ft;
        row.setback_front_ft = d.setback_front_ft;
        row.setback_back_ft = d.setback_back_ft;
        row.setback_side_ft = d.setback_side_ft;
        row.max_height_ft = d.max_height_ft;
        row.parking_spaces_required = d.parking_spaces_required;
    }
    if let Some(a) = adu {
        let d = &a.detail;
        row.adu_type = Some(d.unit_type.clone());
        row.adu_count = d.unit_count;
        row.adu_max_sqft = d.max_sqft;
        row.adu_height = d.height;
        row.adu_length = d.length;
        row.adu_breadth = d.breadth;
        row.adu_setbacks_front_back = d.setbacks_front_back;
        row.adu_side_yards = d.side_yards;
        row.adu_no_of_units = d.no_of_units;
    }
    if let Some(j) = jadu {
        let d = &j.detail;
        row.jadu_type = Some(d.unit_type.clone());
        row.jadu_count = d.unit_count;
        row.jadu_max_sqft = d.max_sqft;
        row.jadu_height = d.height;
        row.jadu_length = d.length;
        row.jadu_breadth = d.breadth;
        row.jadu_setbacks_front_back = d.setbacks_front_back;
        row.jadu_side_yards = d.side_yards;
        row.jadu_no_of_units = d.no_of_units;
    }
    if let Some(p) = parking {
        row.parking_id = Some(p.parking_id);
        row.required_parking_spaces = p.parking_spaces;
        row.eligible_for_bonus = p.eligible_for_bonus;
        row.bonus_type = p.bonus_type.clone();
        row.bonus_percentage = p.bonus_percentage;
    }
    row
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    operations: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the read-only zoning reference table
    pub fn with_zoning_rules(rules: Vec<ZoningRule>) -> Self {
        let store = Self::new();
        store.lock().zoning_rules = rules;
        store
    }

    /// Number of store calls served so far
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        self.operations.fetch_add(1, Ordering::SeqCst);
        f(&self.lock())
    }

    /// Apply `f` to a scratch copy; commit only when it succeeds
    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T, DatabaseError>) -> Result<T, DatabaseError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.lock();
        let mut scratch = guard.clone();
        let value = f(&mut scratch)?;
        *guard = scratch;
        Ok(value)
    }
}

#[async_trait]
impl PropertyStore for MemoryStore {
    async fn create_property(&self, property: NewProperty) -> Result<i64, DatabaseError> {
        self.write(|t| {
            let property_id = t.property_ids.next();
            t.properties.push(Property {
                property_id,
                address: property.address,
                apn: property.apn,
                pincode: property.pincode,
                zoning: property.zoning,
                plot_area_sqft: property.plot_area_sqft,
                height_limit_ft: property.height_limit_ft,
                depth_ft: property.depth_ft,
                width_ft: property.width_ft,
                building_sqft: property.building_sqft,
                usable_sqft: property.usable_sqft,
                parking_spaces: property.parking_spaces,
                garages: property.garages,
                wizard_step: WizardStep::Property,
            });
            Ok(property_id)
        })
    }

    async fn property_rows(&self, property_id: i64) -> Result<Vec<PropertyJoinRow>, DatabaseError> {
        Ok(self.read(|t| t.join_rows(property_id)))
    }

    async fn update_property(&self, property_id: i64, patch: &PropertyPatch) -> Result<(), DatabaseError> {
        if patch.is_empty() {
            return Err(DatabaseError::Validation("No valid fields provided for update".into()));
        }
        self.write(|t| {
            patch.apply_to(t.property_mut(property_id)?);
            Ok(())
        })
    }

    async fn search_properties(&self, query: &str) -> Result<Vec<Property>, DatabaseError> {
        let needle = query.to_lowercase();
        Ok(self.read(|t| {
            t.properties
                .iter()
                .filter(|p| {
                    contains_ignore_case(p.address.as_deref(), &needle)
                        || contains_ignore_case(p.apn.as_deref(), &needle)
                        || contains_ignore_case(p.pincode.as_deref(), &needle)
                })
                .cloned()
                .collect()
        }))
    }

    async fn wizard_step(&self, property_id: i64) -> Result<WizardStep, DatabaseError> {
        self.read(|t| {
            t.properties
                .iter()
                .find(|p| p.property_id == property_id)
                .map(|p| p.wizard_step)
                .ok_or_else(property_not_found)
        })
    }

    async fn insert_setback(&self, setback: NewSetback) -> Result<i64, DatabaseError> {
        self.write(|t| {
            t.advance_step(setback.property_id, WizardStep::Setbacks)?;
            let existing = t.setbacks.iter().filter(|s| s.property_id == setback.property_id).count();
            check_single_row("Setbacks", existing as i64)?;
            let setback_id = t.setback_ids.next();
            t.setbacks.push(Setback {
                setback_id,
                property_id: setback.property_id,
                front_ft: setback.front_ft,
                back_ft: setback.back_ft,
                side_ft: setback.side_ft,
            });
            Ok(setback_id)
        })
    }

    async fn insert_permitted_uses(
        &self,
        property_id: i64,
        uses: Vec<NewPermittedUse>,
    ) -> Result<Vec<i64>, DatabaseError> {
        self.write(|t| {
            t.advance_step(property_id, WizardStep::PermittedUses)?;

            let stored: Vec<String> = t
                .permitted_uses
                .iter()
                .filter(|u| u.property_id == property_id)
                .map(|u| u.detail.use_type.clone())
                .collect();
            check_type_keys("permitted use", uses.iter().map(|u| u.use_type.as_str()), &stored)?;

            let mut ids = Vec::with_capacity(uses.len());
            for detail in uses {
                let use_id = t.use_ids.next();
                t.permitted_uses.push(PermittedUse { use_id, property_id, detail });
                ids.push(use_id);
            }
            Ok(ids)
        })
    }

    async fn insert_unit_details(
        &self,
        kind: UnitKind,
        property_id: i64,
        units: Vec<NewUnitDetail>,
    ) -> Result<Vec<i64>, DatabaseError> {
        self.write(|t| {
            t.advance_step(property_id, kind.wizard_step())?;

            let stored: Vec<String> = t
                .units(kind)
                .iter()
                .filter(|u| u.property_id == property_id)
                .map(|u| u.detail.unit_type.clone())
                .collect();
            check_type_keys(kind.label(), units.iter().map(|u| u.unit_type.as_str()), &stored)?;

            let (rows, sequence) = t.units_mut(kind);
            let mut ids = Vec::with_capacity(units.len());
            for detail in units {
                let unit_id = sequence.next();
                rows.push(UnitDetail { unit_id, property_id, detail });
                ids.push(unit_id);
            }
            Ok(ids)
        })
    }

    async fn insert_parking(&self, parking: NewParkingRequirement) -> Result<i64, DatabaseError> {
        self.write(|t| {
            t.advance_step(parking.property_id, WizardStep::Parking)?;
            let existing = t.parking.iter().filter(|p| p.property_id == parking.property_id).count();
            check_single_row("Parking requirements", existing as i64)?;
            let parking_id = t.parking_ids.next();
            t.parking.push(ParkingRequirement {
                parking_id,
                property_id: parking.property_id,
                parking_spaces: parking.parking_spaces,
                eligible_for_bonus: parking.eligible_for_bonus,
                bonus_type: parking.bonus_type,
                bonus_percentage: parking.bonus_percentage,
            });
            Ok(parking_id)
        })
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<i64, DatabaseError> {
        self.write(|t| {
            if t.users.iter().any(|u| u.email == user.email) {
                return Err(DatabaseError::Conflict("User already exists".into()));
            }
            let id = t.user_ids.next();
            t.users.push(User {
                id,
                full_name: user.full_name,
                email: user.email,
                password: user.password_hash,
                contact_number: user.contact_number,
                role: user.role,
            });
            Ok(id)
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        Ok(self.read(|t| t.users.iter().find(|u| u.email == email).cloned()))
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.read(|t| t.users.iter().find(|u| u.id == id).cloned()))
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        Ok(self.read(|t| t.users.clone()))
    }

    async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<User, DatabaseError> {
        self.write(|t| {
            if let Some(email) = &update.email {
                if t.users.iter().any(|u| u.id != id && &u.email == email) {
                    return Err(DatabaseError::Conflict("Email is already in use".into()));
                }
            }
            let user = t
                .users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or_else(|| DatabaseError::NotFound("User not found".into()))?;
            update.apply_to(user);
            Ok(user.clone())
        })
    }

    async fn delete_user(&self, id: i64) -> Result<(), DatabaseError> {
        self.write(|t| {
            let before = t.users.len();
            t.users.retain(|u| u.id != id);
            if t.users.len() == before {
                return Err(DatabaseError::NotFound("User not found".into()));
            }
            Ok(())
        })
    }

    async fn set_password(&self, id: i64, password_hash: &str) -> Result<(), DatabaseError> {
        self.write(|t| {
            let user = t
                .users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or_else(|| DatabaseError::NotFound("User not found".into()))?;
            user.password = password_hash.to_string();
            Ok(())
        })
    }
}

#[async_trait]
impl ZoningStore for MemoryStore {
    async fn list_zones(&self) -> Result<Vec<ZoningRule>, DatabaseError> {
        Ok(self.read(|t| t.zoning_rules.clone()))
    }

    async fn zones_by_code(
        &self,
        zone_code: &str,
        city: Option<&str>,
    ) -> Result<Vec<ZoningRule>, DatabaseError> {
        let city = city.map(str::to_lowercase);
        Ok(self.read(|t| {
            t.zoning_rules
                .iter()
                .filter(|r| r.zone_code == zone_code)
                .filter(|r| match &city {
                    Some(needle) => contains_ignore_case(r.city.as_deref(), needle),
                    None => true,
                })
                .cloned()
                .collect()
        }))
    }

    async fn zone(&self, id: i64) -> Result<Option<ZoningRule>, DatabaseError> {
        Ok(self.read(|t| t.zoning_rules.iter().find(|r| r.id == id).cloned()))
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn record_file(&self, file: NewUploadedFile) -> Result<UploadedFile, DatabaseError> {
        self.write(|t| {
            let stored = UploadedFile {
                id: t.file_ids.next(),
                filename: file.filename,
                file_path: file.file_path,
                upload_date: Utc::now(),
            };
            t.files.push(stored.clone());
            Ok(stored)
        })
    }

    async fn list_files(&self) -> Result<Vec<UploadedFile>, DatabaseError> {
        Ok(self.read(|t| newest_first(t.files.iter())))
    }

    async fn search_files(&self, filename: &str) -> Result<Vec<UploadedFile>, DatabaseError> {
        let needle = filename.to_lowercase();
        Ok(self.read(|t| {
            newest_first(
                t.files
                    .iter()
                    .filter(|f| contains_ignore_case(Some(f.filename.as_str()), &needle)),
            )
        }))
    }

    async fn delete_file(&self, id: i64) -> Result<UploadedFile, DatabaseError> {
        self.write(|t| {
            let index = t
                .files
                .iter()
                .position(|f| f.id == id)
                .ok_or_else(|| DatabaseError::NotFound("File not found".into()))?;
            Ok(t.files.remove(index))
        })
    }
}

fn newest_first<'a>(files: impl Iterator<Item = &'a UploadedFile>) -> Vec<UploadedFile> {
    let mut files: Vec<UploadedFile> = files.cloned().collect();
    files.sort_by(|a, b| b.upload_date.cmp(&a.upload_date).then(b.id.cmp(&a.id)));
    files
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::aggregate_property;

    fn permitted(use_type: &str) -> NewPermittedUse {
        NewPermittedUse {
            use_type: use_type.to_string(),
            lot_area_sqft: Some(5000.0),
            lot_width_ft: None,
            lot_depth_ft: None,
            setback_front_ft: None,
            setback_back_ft: None,
            setback_side_ft: None,
            max_height_ft: None,
            parking_spaces_required: Some(2),
        }
    }

    fn unit(unit_type: &str) -> NewUnitDetail {
        NewUnitDetail {
            unit_type: unit_type.to_string(),
            unit_count: Some(1),
            max_sqft: Some(800.0),
            height: None,
            length: None,
            breadth: None,
            setbacks_front_back: None,
            side_yards: None,
            no_of_units: None,
        }
    }

    #[tokio::test]
    async fn join_rows_are_the_cartesian_product() {
        let store = MemoryStore::new();
        let id = store.create_property(NewProperty::default()).await.unwrap();
        store
            .insert_permitted_uses(id, vec![permitted("Single-Family"), permitted("Garage")])
            .await
            .unwrap();
        store
            .insert_unit_details(UnitKind::Adu, id, vec![unit("Attached"), unit("Detached"), unit("Conversion")])
            .await
            .unwrap();
        store.insert_unit_details(UnitKind::Jadu, id, vec![unit("Interior")]).await.unwrap();

        let rows = store.property_rows(id).await.unwrap();
        assert_eq!(rows.len(), 6);

        let detail = aggregate_property(&rows).unwrap();
        assert_eq!(detail.permitted_uses.len(), 2);
        assert_eq!(detail.adu_details.len(), 3);
        assert_eq!(detail.jadu_details.len(), 1);
    }

    #[tokio::test]
    async fn missing_property_has_no_rows() {
        let store = MemoryStore::new();
        assert!(store.property_rows(99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_submission_leaves_no_rows_behind() {
        let store = MemoryStore::new();
        let id = store.create_property(NewProperty::default()).await.unwrap();
        store.insert_permitted_uses(id, vec![permitted("Garage")]).await.unwrap();

        let err = store
            .insert_permitted_uses(id, vec![permitted("Single-Family"), permitted("Garage")])
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));

        let detail = aggregate_property(&store.property_rows(id).await.unwrap()).unwrap();
        assert_eq!(detail.permitted_uses.len(), 1);
        assert!(detail.permitted_uses.contains_key("Garage"));
    }

    #[tokio::test]
    async fn wizard_step_is_checked_and_advanced() {
        let store = MemoryStore::new();
        let id = store.create_property(NewProperty::default()).await.unwrap();
        assert_eq!(store.wizard_step(id).await.unwrap(), WizardStep::Property);

        store.insert_unit_details(UnitKind::Jadu, id, vec![unit("Interior")]).await.unwrap();
        assert_eq!(store.wizard_step(id).await.unwrap(), WizardStep::Jadu);

        let err = store
            .insert_setback(NewSetback {
                property_id: id,
                front_ft: Some(20.0),
                back_ft: None,
                side_ft: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
        assert_eq!(store.wizard_step(id).await.unwrap(), WizardStep::Jadu);
    }

    #[tokio::test]
    async fn setbacks_hold_a_single_row() {
        let store = MemoryStore::new();
        let id = store.create_property(NewProperty::default()).await.unwrap();
        let setback = |front| NewSetback {
            property_id: id,
            front_ft: Some(front),
            back_ft: None,
            side_ft: None,
        };

        store.insert_setback(setback(20.0)).await.unwrap();
        let err = store.insert_setback(setback(35.0)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));

        let rows = store.property_rows(id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(aggregate_property(&rows).unwrap().front_ft, Some(20.0));
    }

    #[tokio::test]
    async fn dependents_require_an_existing_property() {
        let store = MemoryStore::new();
        let err = store.insert_permitted_uses(7, vec![permitted("Garage")]).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_emails_conflict() {
        let store = MemoryStore::new();
        let user = NewUser {
            full_name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "hash".into(),
            contact_number: None,
            role: crate::types::Role::User,
        };
        store.create_user(user.clone()).await.unwrap();
        assert!(matches!(store.create_user(user).await, Err(DatabaseError::Conflict(_))));
    }

    #[tokio::test]
    async fn zones_filter_by_code_and_city() {
        let store = MemoryStore::with_zoning_rules(vec![
            ZoningRule { id: 1, zone_code: "R1".into(), city: Some("San Jose".into()), ..Default::default() },
            ZoningRule { id: 2, zone_code: "R1".into(), city: Some("Oakland".into()), ..Default::default() },
            ZoningRule { id: 3, zone_code: "C2".into(), city: Some("San Jose".into()), ..Default::default() },
        ]);

        assert_eq!(store.zones_by_code("R1", None).await.unwrap().len(), 2);
        let filtered = store.zones_by_code("R1", Some("jose")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);
        assert!(store.zone(4).await.unwrap().is_none());
    }
}
