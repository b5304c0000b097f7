use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::Role;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    /// bcrypt hash
    #[serde(skip_serializing)]
    pub password: String,
    pub contact_number: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

pub const USER_COLUMNS: &str = "id, full_name, email, password, contact_number, role";

#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub contact_number: Option<String>,
    pub role: Role,
}

/// Body of `PUT /users/:id`; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub role: Option<Role>,
}

impl UserUpdate {
    pub fn apply_to(&self, user: &mut User) {
        if let Some(full_name) = &self.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(contact_number) = &self.contact_number {
            user.contact_number = Some(contact_number.clone());
        }
        if let Some(role) = self.role {
            user.role = role;
        }
    }
}
