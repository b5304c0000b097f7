use async_trait::async_trait;
use sqlx::{MySql, MySqlConnection, MySqlPool, QueryBuilder};
use tracing::{debug, info};

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{
    property::PROPERTY_COLUMNS, user::USER_COLUMNS, zoning::ZONING_RULE_COLUMNS,
    join_row::PROPERTY_DETAIL_QUERY, NewParkingRequirement, NewPermittedUse, NewProperty,
    NewSetback, NewUnitDetail, NewUploadedFile, NewUser, PatchValue, Property, PropertyJoinRow,
    PropertyPatch, UnitKind, UploadedFile, User, UserUpdate, ZoningRule,
};
use super::store::{
    check_single_row, check_type_keys, escape_like, property_not_found, FileStore, PropertyStore, Store, UserStore,
    ZoningStore,
};
use crate::services::wizard::{self, WizardStep};

const FILE_COLUMNS: &str = "id, filename, file_path, upload_date";

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Lock the property row and read its wizard step
async fn locked_step(conn: &mut MySqlConnection, property_id: i64) -> Result<WizardStep, DatabaseError> {
    let step: Option<String> =
        sqlx::query_scalar("SELECT wizard_step FROM properties WHERE property_id = ? FOR UPDATE")
            .bind(property_id)
            .fetch_optional(&mut *conn)
            .await?;

    let step = step.ok_or_else(property_not_found)?;
    step.parse::<WizardStep>()
        .map_err(|e| DatabaseError::Validation(e.to_string()))
}

/// Check `requested` against the stored step and persist the move
async fn advance_step(
    conn: &mut MySqlConnection,
    property_id: i64,
    requested: WizardStep,
) -> Result<(), DatabaseError> {
    let current = locked_step(conn, property_id).await?;
    let next = wizard::advance(current, requested)?;

    if next != current {
        sqlx::query("UPDATE properties SET wizard_step = ? WHERE property_id = ?")
            .bind(next.as_str())
            .bind(property_id)
            .execute(&mut *conn)
            .await?;
        debug!("Property {} moved from {} to {}", property_id, current, next);
    }
    Ok(())
}

fn unique_violation(err: sqlx::Error, message: &str) -> DatabaseError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            DatabaseError::Conflict(message.to_string())
        }
        _ => DatabaseError::Sqlx(err),
    }
}

#[async_trait]
impl PropertyStore for MySqlStore {
    async fn create_property(&self, property: NewProperty) -> Result<i64, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO properties \
             (address, apn, pincode, zoning, plot_area_sqft, height_limit_ft, depth_ft, width_ft, \
              building_sqft, usable_sqft, parking_spaces, garages, wizard_step) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(property.address)
        .bind(property.apn)
        .bind(property.pincode)
        .bind(property.zoning)
        .bind(property.plot_area_sqft)
        .bind(property.height_limit_ft)
        .bind(property.depth_ft)
        .bind(property.width_ft)
        .bind(property.building_sqft)
        .bind(property.usable_sqft)
        .bind(property.parking_spaces)
        .bind(property.garages)
        .bind(WizardStep::Property.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id() as i64)
    }

    async fn property_rows(&self, property_id: i64) -> Result<Vec<PropertyJoinRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PropertyJoinRow>(PROPERTY_DETAIL_QUERY)
            .bind(property_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update_property(&self, property_id: i64, patch: &PropertyPatch) -> Result<(), DatabaseError> {
        if patch.is_empty() {
            return Err(DatabaseError::Validation("No valid fields provided for update".into()));
        }

        // MySQL reports 0 affected rows when values are unchanged, so
        // existence is checked separately under the same lock.
        let mut tx = self.pool.begin().await?;
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT property_id FROM properties WHERE property_id = ? FOR UPDATE")
                .bind(property_id)
                .fetch_optional(&mut *tx)
                .await?;
        exists.ok_or_else(property_not_found)?;

        let mut builder = QueryBuilder::<MySql>::new("UPDATE properties SET ");
        let mut assignments = builder.separated(", ");
        for (field, value) in &patch.fields {
            assignments.push(field.column());
            assignments.push_unseparated(" = ");
            match value.clone() {
                PatchValue::Text(v) => assignments.push_bind_unseparated(v),
                PatchValue::Real(v) => assignments.push_bind_unseparated(v),
                PatchValue::Integer(v) => assignments.push_bind_unseparated(v),
            };
        }
        builder.push(" WHERE property_id = ").push_bind(property_id);
        builder.build().execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn search_properties(&self, query: &str) -> Result<Vec<Property>, DatabaseError> {
        let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
        let sql = format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties \
             WHERE LOWER(address) LIKE ? ESCAPE '\\\\' \
                OR LOWER(apn) LIKE ? ESCAPE '\\\\' \
                OR pincode LIKE ? ESCAPE '\\\\' \
             ORDER BY property_id"
        );

        let rows = sqlx::query_as::<_, Property>(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn wizard_step(&self, property_id: i64) -> Result<WizardStep, DatabaseError> {
        let step: Option<String> =
            sqlx::query_scalar("SELECT wizard_step FROM properties WHERE property_id = ?")
                .bind(property_id)
                .fetch_optional(&self.pool)
                .await?;

        let step = step.ok_or_else(property_not_found)?;
        step.parse().map_err(|e: wizard::WizardError| DatabaseError::Validation(e.to_string()))
    }

    async fn insert_setback(&self, setback: NewSetback) -> Result<i64, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        advance_step(&mut tx, setback.property_id, WizardStep::Setbacks).await?;

        // Serialized by the property row lock taken in advance_step
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM setbacks WHERE property_id = ?")
            .bind(setback.property_id)
            .fetch_one(&mut *tx)
            .await?;
        check_single_row("Setbacks", existing)?;

        let result = sqlx::query(
            "INSERT INTO setbacks (property_id, front_ft, back_ft, side_ft) VALUES (?, ?, ?, ?)",
        )
        .bind(setback.property_id)
        .bind(setback.front_ft)
        .bind(setback.back_ft)
        .bind(setback.side_ft)
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "Setbacks already recorded for this property"))?;

        tx.commit().await?;
        Ok(result.last_insert_id() as i64)
    }

    async fn insert_permitted_uses(
        &self,
        property_id: i64,
        uses: Vec<NewPermittedUse>,
    ) -> Result<Vec<i64>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        advance_step(&mut tx, property_id, WizardStep::PermittedUses).await?;

        let stored: Vec<String> =
            sqlx::query_scalar("SELECT use_type FROM lot_zoning_details WHERE property_id = ?")
                .bind(property_id)
                .fetch_all(&mut *tx)
                .await?;
        check_type_keys("permitted use", uses.iter().map(|u| u.use_type.as_str()), &stored)?;

        let mut ids = Vec::with_capacity(uses.len());
        for detail in uses {
            let result = sqlx::query(
                "INSERT INTO lot_zoning_details \
                 (property_id, use_type, lot_area_sqft, lot_width_ft, lot_depth_ft, \
                  setback_front_ft, setback_back_ft, setback_side_ft, max_height_ft, \
                  parking_spaces_required) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(property_id)
            .bind(detail.use_type)
            .bind(detail.lot_area_sqft)
            .bind(detail.lot_width_ft)
            .bind(detail.lot_depth_ft)
            .bind(detail.setback_front_ft)
            .bind(detail.setback_back_ft)
            .bind(detail.setback_side_ft)
            .bind(detail.max_height_ft)
            .bind(detail.parking_spaces_required)
            .execute(&mut *tx)
            .await?;
            ids.push(result.last_insert_id() as i64);
        }

        tx.commit().await?;
        Ok(ids)
    }

    async fn insert_unit_details(
        &self,
        kind: UnitKind,
        property_id: i64,
        units: Vec<NewUnitDetail>,
    ) -> Result<Vec<i64>, DatabaseError> {
        let table = kind.table();
        let prefix = kind.prefix();

        let mut tx = self.pool.begin().await?;
        advance_step(&mut tx, property_id, kind.wizard_step()).await?;

        let stored: Vec<String> =
            sqlx::query_scalar(&format!("SELECT {prefix}_type FROM {table} WHERE property_id = ?"))
                .bind(property_id)
                .fetch_all(&mut *tx)
                .await?;
        check_type_keys(kind.label(), units.iter().map(|u| u.unit_type.as_str()), &stored)?;

        let sql = format!(
            "INSERT INTO {table} \
             (property_id, {prefix}_type, {prefix}_count, {prefix}_max_sqft, height, length, breadth, \
              setbacks_front_back, side_yards, no_of_units) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );

        let mut ids = Vec::with_capacity(units.len());
        for unit in units {
            let result = sqlx::query(&sql)
                .bind(property_id)
                .bind(unit.unit_type)
                .bind(unit.unit_count)
                .bind(unit.max_sqft)
                .bind(unit.height)
                .bind(unit.length)
                .bind(unit.breadth)
                .bind(unit.setbacks_front_back)
                .bind(unit.side_yards)
                .bind(unit.no_of_units)
                .execute(&mut *tx)
                .await?;
            ids.push(result.last_insert_id() as i64);
        }

        tx.commit().await?;
        Ok(ids)
    }

    async fn insert_parking(&self, parking: NewParkingRequirement) -> Result<i64, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        advance_step(&mut tx, parking.property_id, WizardStep::Parking).await?;

        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM parking_requirements WHERE property_id = ?")
                .bind(parking.property_id)
                .fetch_one(&mut *tx)
                .await?;
        check_single_row("Parking requirements", existing)?;

        let result = sqlx::query(
            "INSERT INTO parking_requirements \
             (property_id, parking_spaces, eligible_for_bonus, bonus_type, bonus_percentage) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(parking.property_id)
        .bind(parking.parking_spaces)
        .bind(parking.eligible_for_bonus)
        .bind(parking.bonus_type)
        .bind(parking.bonus_percentage)
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "Parking requirements already recorded for this property"))?;

        tx.commit().await?;
        Ok(result.last_insert_id() as i64)
    }
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn create_user(&self, user: NewUser) -> Result<i64, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO users (full_name, email, password, contact_number, role) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user.full_name)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.contact_number)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "User already exists"))?;

        Ok(result.last_insert_id() as i64)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<User, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let mut user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ? FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("User not found".into()))?;

        update.apply_to(&mut user);

        sqlx::query("UPDATE users SET full_name = ?, email = ?, contact_number = ?, role = ? WHERE id = ?")
            .bind(&user.full_name)
            .bind(&user.email)
            .bind(&user.contact_number)
            .bind(user.role.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| unique_violation(e, "Email is already in use"))?;

        tx.commit().await?;
        Ok(user)
    }

    async fn delete_user(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User not found".into()));
        }
        info!("Deleted user {}", id);
        Ok(())
    }

    async fn set_password(&self, id: i64, password_hash: &str) -> Result<(), DatabaseError> {
        // Fresh bcrypt salts make every hash differ, so 0 rows means no user
        let result = sqlx::query("UPDATE users SET password = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User not found".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ZoningStore for MySqlStore {
    async fn list_zones(&self) -> Result<Vec<ZoningRule>, DatabaseError> {
        let rules = sqlx::query_as::<_, ZoningRule>(&format!(
            "SELECT {ZONING_RULE_COLUMNS} FROM zoning_rules ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rules)
    }

    async fn zones_by_code(
        &self,
        zone_code: &str,
        city: Option<&str>,
    ) -> Result<Vec<ZoningRule>, DatabaseError> {
        let mut builder = QueryBuilder::<MySql>::new(format!(
            "SELECT {ZONING_RULE_COLUMNS} FROM zoning_rules WHERE zone_code = "
        ));
        builder.push_bind(zone_code);
        if let Some(city) = city {
            builder
                .push(" AND city LIKE ")
                .push_bind(format!("%{}%", escape_like(city)))
                .push(" ESCAPE '\\\\'");
        }
        builder.push(" ORDER BY id");

        let rules = builder
            .build_query_as::<ZoningRule>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rules)
    }

    async fn zone(&self, id: i64) -> Result<Option<ZoningRule>, DatabaseError> {
        let rule = sqlx::query_as::<_, ZoningRule>(&format!(
            "SELECT {ZONING_RULE_COLUMNS} FROM zoning_rules WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rule)
    }
}

#[async_trait]
impl FileStore for MySqlStore {
    async fn record_file(&self, file: NewUploadedFile) -> Result<UploadedFile, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("INSERT INTO uploaded_files (filename, file_path) VALUES (?, ?)")
            .bind(&file.filename)
            .bind(&file.file_path)
            .execute(&mut *tx)
            .await?;

        let stored = sqlx::query_as::<_, UploadedFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM uploaded_files WHERE id = ?"
        ))
        .bind(result.last_insert_id() as i64)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(stored)
    }

    async fn list_files(&self) -> Result<Vec<UploadedFile>, DatabaseError> {
        let files = sqlx::query_as::<_, UploadedFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM uploaded_files ORDER BY upload_date DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(files)
    }

    async fn search_files(&self, filename: &str) -> Result<Vec<UploadedFile>, DatabaseError> {
        let files = sqlx::query_as::<_, UploadedFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM uploaded_files WHERE filename LIKE ? ESCAPE '\\\\' \
             ORDER BY upload_date DESC, id DESC"
        ))
        .bind(format!("%{}%", escape_like(filename)))
        .fetch_all(&self.pool)
        .await?;
        Ok(files)
    }

    async fn delete_file(&self, id: i64) -> Result<UploadedFile, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let file = sqlx::query_as::<_, UploadedFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM uploaded_files WHERE id = ? FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("File not found".into()))?;

        sqlx::query("DELETE FROM uploaded_files WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(file)
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
