//! User CRUD use cases.
//!
//! Each operation validates first, then acquires exactly one session, and
//! only commits once every store call has succeeded. Returning early drops
//! the session, which rolls back and releases it.

use tracing::{info, instrument, warn};

use crate::auth::password::hash_password;
use crate::db::SessionProvider;
use crate::error::{AppError, AppResult};
use crate::users::dto::{DeleteResponse, UserCreate, UserResponse, UserUpdate};
use crate::users::patch::Patch;
use crate::users::repo::UserStore;
use crate::users::repo_types::{NewUser, UserRecord};
use crate::validation::{normalize_email, ValidationError};

pub const USER_NOT_FOUND: &str = "User not found!";
pub const USER_DOES_NOT_EXIST: &str = "User does not exist!";
pub const USER_ALREADY_EXISTS: &str = "User already exists!";
pub const USER_DELETED: &str = "User deleted!";

#[derive(Clone)]
pub struct UserService {
    sessions: SessionProvider,
}

impl UserService {
    pub fn new(sessions: SessionProvider) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &SessionProvider {
        &self.sessions
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i64) -> AppResult<UserResponse> {
        self.find_record(id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.into()))
    }

    /// Loads the full stored row, password hash included.
    pub async fn find_record(&self, id: i64) -> AppResult<Option<UserRecord>> {
        let mut session = self.sessions.read().await?;
        let record = session.users().find_by_id(id).await?;
        Ok(record)
    }

    pub async fn find_record_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let email = normalize_email(email);
        let mut session = self.sessions.read().await?;
        let record = session.users().find_by_email(&email).await?;
        Ok(record)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: UserCreate) -> AppResult<UserResponse> {
        input.validate()?;

        let hashed_password = input.password.as_deref().map(hash_password).transpose()?;
        let new_user = NewUser {
            name: input.name,
            email: normalize_email(&input.email),
            role: input.role,
            hashed_password,
            is_active: input.is_active.unwrap_or(true),
        };

        let mut session = self.sessions.write().await?;
        let mut users = session.users();
        if users.find_by_email(&new_user.email).await?.is_some() {
            warn!(email = %new_user.email, "email already registered");
            return Err(AppError::Conflict(USER_ALREADY_EXISTS.into()));
        }
        let created = users.insert(&new_user).await?;
        drop(users);
        session.commit().await?;

        info!(user_id = created.id, "user created");
        Ok(created.into())
    }

    #[instrument(skip(self, patch))]
    pub async fn update_user(&self, id: i64, mut patch: UserUpdate) -> AppResult<UserResponse> {
        patch.validate()?;
        if let Patch::Set(email) = &mut patch.email {
            *email = normalize_email(email);
        }
        let new_hash = patch.password.as_set().map(|p| hash_password(p)).transpose()?;

        let mut session = self.sessions.write().await?;
        let mut users = session.users();
        let current = users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(USER_DOES_NOT_EXIST.into()))?;

        let mut fields = patch.merge_into(&current);
        if let Some(hash) = new_hash {
            fields.hashed_password = Some(hash);
        }
        let updated = users.update(id, &fields).await?;
        drop(users);
        session.commit().await?;

        info!(user_id = id, "user updated");
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> AppResult<DeleteResponse> {
        let mut session = self.sessions.write().await?;
        let removed = session.users().delete(id).await?;
        session.commit().await?;

        info!(user_id = id, "user deleted");
        Ok(DeleteResponse {
            message: USER_DELETED.into(),
            deleted_user: removed.into(),
        })
    }

    /// All users in id order. An empty store yields an empty list.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> AppResult<Vec<UserResponse>> {
        let mut session = self.sessions.read().await?;
        let users = session.users().list_all().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// First user whose name equals `name` exactly.
    #[instrument(skip(self))]
    pub async fn search_by_name(&self, name: Option<&str>) -> AppResult<UserResponse> {
        let name = match name {
            None => return Err(ValidationError::Missing { field: "name" }.into()),
            Some(n) if n.trim().is_empty() => {
                return Err(ValidationError::Empty { field: "name" }.into())
            }
            Some(n) => n,
        };

        let mut session = self.sessions.read().await?;
        let users = session.users().list_all().await?;
        users
            .into_iter()
            .find(|user| user.name == name)
            .map(UserResponse::from)
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::db::connect_in_memory;

    async fn service() -> UserService {
        UserService::new(SessionProvider::new(connect_in_memory().await.unwrap()))
    }

    fn create(name: &str, email: &str, role: &str) -> UserCreate {
        UserCreate {
            name: name.into(),
            email: email.into(),
            role: role.into(),
            password: None,
            is_active: None,
        }
    }

    fn role_only(role: &str) -> UserUpdate {
        UserUpdate {
            role: Patch::Set(role.into()),
            ..UserUpdate::default()
        }
    }

    #[tokio::test]
    async fn gabs_scenario() {
        let svc = service().await;

        let created = svc
            .create_user(create("Gabs", "g@x.com", "Developer"))
            .await
            .unwrap();
        assert_eq!(created.id, 1);

        let loaded = svc.get_user(1).await.unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.name, "Gabs");
        assert_eq!(loaded.email, "g@x.com");
        assert_eq!(loaded.role, "Developer");
        assert!(loaded.is_active);

        let dup = svc
            .create_user(create("Other", "g@x.com", "QA"))
            .await
            .unwrap_err();
        assert!(matches!(dup, AppError::Conflict(_)));

        let deleted = svc.delete_user(1).await.unwrap();
        assert_eq!(deleted.message, USER_DELETED);
        assert_eq!(deleted.deleted_user, created);

        let gone = svc.get_user(1).await.unwrap_err();
        assert!(matches!(gone, AppError::NotFound(ref m) if m == USER_NOT_FOUND));
        assert_eq!(svc.sessions().open_sessions(), 0);
    }

    #[tokio::test]
    async fn duplicate_email_leaves_store_unchanged() {
        let svc = service().await;
        svc.create_user(create("Gabs", "g@x.com", "Developer"))
            .await
            .unwrap();
        let before = svc.list_users().await.unwrap();

        let err = svc
            .create_user(create("Gabs", "G@X.COM ", "Developer"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(svc.list_users().await.unwrap(), before);
        assert_eq!(svc.sessions().open_sessions(), 0);
    }

    #[tokio::test]
    async fn invalid_create_never_opens_a_session() {
        let svc = service().await;
        let err = svc
            .create_user(create("  ", "g@x.com", "Developer"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(svc.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_missing_user_is_not_found_and_mutates_nothing() {
        let svc = service().await;
        svc.create_user(create("Gabs", "g@x.com", "Developer"))
            .await
            .unwrap();
        let before = svc.list_users().await.unwrap();

        let err = svc.update_user(99, role_only("Lead")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == USER_DOES_NOT_EXIST));
        assert_eq!(svc.list_users().await.unwrap(), before);
        assert_eq!(svc.sessions().open_sessions(), 0);
    }

    #[tokio::test]
    async fn partial_update_only_touches_set_fields() {
        let svc = service().await;
        let created = svc
            .create_user(create("Gabs", "g@x.com", "Developer"))
            .await
            .unwrap();

        let updated = svc.update_user(created.id, role_only("Lead")).await.unwrap();
        assert_eq!(updated.role, "Lead");
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.email, created.email);
        assert_eq!(svc.get_user(created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn full_update_overwrites_everything() {
        let svc = service().await;
        let created = svc
            .create_user(create("Gabs", "g@x.com", "Developer"))
            .await
            .unwrap();

        let patch = UserUpdate {
            name: Patch::Set("Gabriel".into()),
            email: Patch::Set("Gabriel@X.com".into()),
            role: Patch::Set("Lead".into()),
            password: Patch::Unset,
            is_active: Patch::Set(false),
        };
        let updated = svc.update_user(created.id, patch).await.unwrap();
        assert_eq!(
            updated,
            UserResponse {
                id: created.id,
                name: "Gabriel".into(),
                email: "gabriel@x.com".into(),
                role: "Lead".into(),
                is_active: false,
            }
        );
    }

    #[tokio::test]
    async fn update_to_taken_email_conflicts() {
        let svc = service().await;
        svc.create_user(create("Gabs", "g@x.com", "Developer"))
            .await
            .unwrap();
        let ana = svc
            .create_user(create("Ana", "a@x.com", "QA"))
            .await
            .unwrap();

        let patch = UserUpdate {
            email: Patch::Set("g@x.com".into()),
            ..UserUpdate::default()
        };
        let err = svc.update_user(ana.id, patch).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(svc.get_user(ana.id).await.unwrap(), ana);
        assert_eq!(svc.sessions().open_sessions(), 0);
    }

    #[tokio::test]
    async fn password_is_stored_hashed_and_replaced_on_update() {
        let svc = service().await;
        let mut input = create("Gabs", "g@x.com", "Developer");
        input.password = Some("first-password".into());
        let created = svc.create_user(input).await.unwrap();

        let record = svc.find_record(created.id).await.unwrap().unwrap();
        let first_hash = record.hashed_password.unwrap();
        assert_ne!(first_hash, "first-password");
        assert!(verify_password("first-password", &first_hash).unwrap());

        let patch = UserUpdate {
            password: Patch::Set("second-password".into()),
            ..UserUpdate::default()
        };
        svc.update_user(created.id, patch).await.unwrap();
        let second_hash = svc
            .find_record(created.id)
            .await
            .unwrap()
            .unwrap()
            .hashed_password
            .unwrap();
        assert!(verify_password("second-password", &second_hash).unwrap());
        assert!(!verify_password("first-password", &second_hash).unwrap());
    }

    #[tokio::test]
    async fn delete_missing_user_is_not_found() {
        let svc = service().await;
        let err = svc.delete_user(5).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(svc.sessions().open_sessions(), 0);
    }

    #[tokio::test]
    async fn list_of_empty_store_is_empty() {
        let svc = service().await;
        assert!(svc.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_returns_first_exact_match() {
        let svc = service().await;
        let first = svc
            .create_user(create("Gabs", "g1@x.com", "Developer"))
            .await
            .unwrap();
        svc.create_user(create("Gabs", "g2@x.com", "QA"))
            .await
            .unwrap();

        assert_eq!(svc.search_by_name(Some("Gabs")).await.unwrap(), first);
        assert!(matches!(
            svc.search_by_name(Some("gabs")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn search_requires_a_name() {
        let svc = service().await;
        assert!(matches!(
            svc.search_by_name(None).await,
            Err(AppError::Validation(ValidationError::Missing { field: "name" }))
        ));
        assert!(matches!(
            svc.search_by_name(Some("  ")).await,
            Err(AppError::Validation(ValidationError::Empty { field: "name" }))
        ));
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() {
        let svc = service().await;
        let mut handles = Vec::new();
        for i in 0..8 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move {
                svc.create_user(create(&format!("user{i}"), &format!("u{i}@x.com"), "Dev"))
                    .await
                    .unwrap()
                    .id
            }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);
        assert_eq!(svc.sessions().open_sessions(), 0);
    }
}
