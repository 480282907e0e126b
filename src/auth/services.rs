use tracing::{info, instrument, warn};

use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::users::dto::UserResponse;
use crate::users::repo_types::UserRecord;
use crate::users::services::UserService;

pub const BAD_CREDENTIALS: &str = "Incorrect username or password";
pub const INACTIVE_USER: &str = "Inactive user";

/// Checks an email/password pair against the stored Argon2 hash.
///
/// Unknown emails, users without a password and wrong passwords all give
/// the same error.
#[instrument(skip(users, password))]
pub async fn authenticate(users: &UserService, email: &str, password: &str) -> AppResult<UserRecord> {
    // The read session is released before the hash is checked.
    let Some(user) = users.find_record_by_email(email).await? else {
        warn!("login unknown email");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    };

    let Some(hash) = user.hashed_password.as_deref() else {
        warn!(user_id = user.id, "login for user without password");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    };

    if !verify_password(password, hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    if !user.is_active {
        warn!(user_id = user.id, "login for inactive user");
        return Err(AppError::Unauthorized(INACTIVE_USER.into()));
    }

    info!(user_id = user.id, "user authenticated");
    Ok(user)
}

/// Resolves the token subject to an active user.
pub async fn current_active_user(users: &UserService, user_id: i64) -> AppResult<UserResponse> {
    let user = users
        .find_record(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Could not validate credentials".into()))?;
    if !user.is_active {
        return Err(AppError::Unauthorized(INACTIVE_USER.into()));
    }
    Ok(user.into())
}
