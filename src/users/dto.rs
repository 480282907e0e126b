use serde::{Deserialize, Serialize};

use crate::users::patch::Patch;
use crate::users::repo_types::{UserFields, UserRecord};
use crate::validation::{require_email, require_password, require_text, ValidationError};

/// Request body for creating a user. Clients never send `id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl UserCreate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_email(self.email.trim())?;
        require_text("role", &self.role)?;
        if let Some(password) = &self.password {
            require_password(password)?;
        }
        Ok(())
    }
}

/// Request body for updating a user; only keys that are present overwrite.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserUpdate {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub email: Patch<String>,
    #[serde(default)]
    pub role: Patch<String>,
    #[serde(default)]
    pub password: Patch<String>,
    #[serde(default)]
    pub is_active: Patch<bool>,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = self.name.as_set() {
            require_text("name", name)?;
        }
        if let Some(email) = self.email.as_set() {
            require_email(email.trim())?;
        }
        if let Some(role) = self.role.as_set() {
            require_text("role", role)?;
        }
        if let Some(password) = self.password.as_set() {
            require_password(password)?;
        }
        Ok(())
    }

    /// Overlays the set fields on `current`. The password hash is kept; the
    /// caller replaces it after hashing a new password.
    pub fn merge_into(&self, current: &UserRecord) -> UserFields {
        UserFields {
            name: self.name.resolve(&current.name),
            email: self.email.resolve(&current.email),
            role: self.role.resolve(&current.role),
            hashed_password: current.hashed_password.clone(),
            is_active: self.is_active.resolve(&current.is_active),
        }
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            role: record.role,
            is_active: record.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub deleted_user: UserResponse,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
}
