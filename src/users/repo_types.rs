use serde::Serialize;
use sqlx::FromRow;

/// Row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub hashed_password: Option<String>, // Argon2 hash, not exposed in JSON
    pub is_active: bool,
}

/// Insert payload; the store assigns `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: String,
    pub hashed_password: Option<String>,
    pub is_active: bool,
}

/// Every mutable column of a user; `update` overwrites all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFields {
    pub name: String,
    pub email: String,
    pub role: String,
    pub hashed_password: Option<String>,
    pub is_active: bool,
}

impl From<&UserRecord> for UserFields {
    fn from(record: &UserRecord) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            role: record.role.clone(),
            hashed_password: record.hashed_password.clone(),
            is_active: record.is_active,
        }
    }
}
