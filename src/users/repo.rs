//! User persistence contract and its SQLite implementation.
//!
//! The store only ever borrows a connection owned by a session, so it never
//! decides transaction boundaries itself.

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::users::repo_types::{NewUser, UserFields, UserRecord};

const USER_COLUMNS: &str = "id, name, email, role, hashed_password, is_active";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("user not found: {0}")]
    NotFound(i64),

    #[error("email already registered: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Keyed storage of users with a unique `email`.
#[async_trait]
pub trait UserStore: Send {
    async fn find_by_id(&mut self, id: i64) -> RepoResult<Option<UserRecord>>;
    async fn find_by_email(&mut self, email: &str) -> RepoResult<Option<UserRecord>>;
    async fn insert(&mut self, user: &NewUser) -> RepoResult<UserRecord>;
    async fn update(&mut self, id: i64, fields: &UserFields) -> RepoResult<UserRecord>;
    async fn delete(&mut self, id: i64) -> RepoResult<UserRecord>;
    async fn list_all(&mut self) -> RepoResult<Vec<UserRecord>>;
}

pub struct SqliteUserStore<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> SqliteUserStore<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore<'_> {
    async fn find_by_id(&mut self, id: i64) -> RepoResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&mut self, email: &str) -> RepoResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(user)
    }

    async fn insert(&mut self, user: &NewUser) -> RepoResult<UserRecord> {
        let created = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (name, email, role, hashed_password, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.role)
        .bind(user.hashed_password.as_deref())
        .bind(user.is_active)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| conflict_or_db(e, &user.email))?;
        Ok(created)
    }

    async fn update(&mut self, id: i64, fields: &UserFields) -> RepoResult<UserRecord> {
        let updated = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            UPDATE users
               SET name = ?1,
                   email = ?2,
                   role = ?3,
                   hashed_password = ?4,
                   is_active = ?5
             WHERE id = ?6
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.role)
        .bind(fields.hashed_password.as_deref())
        .bind(fields.is_active)
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await
        .map_err(|e| conflict_or_db(e, &fields.email))?;

        updated.ok_or(RepoError::NotFound(id))
    }

    async fn delete(&mut self, id: i64) -> RepoResult<UserRecord> {
        let removed = sqlx::query_as::<_, UserRecord>(&format!(
            "DELETE FROM users WHERE id = ?1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        removed.ok_or(RepoError::NotFound(id))
    }

    async fn list_all(&mut self) -> RepoResult<Vec<UserRecord>> {
        let users = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"
        ))
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(users)
    }
}

fn conflict_or_db(err: sqlx::Error, email: &str) -> RepoError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::Conflict(email.to_owned())
        }
        _ => RepoError::Db(err),
    }
}
