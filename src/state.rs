use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::db::{self, SessionProvider};
use crate::users::services::UserService;

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config).await?;
        Ok(Self::from_parts(pool, Arc::new(config)))
    }

    pub fn from_parts(pool: SqlitePool, config: Arc<AppConfig>) -> Self {
        let jwt = JwtKeys::from(&config.jwt);
        Self {
            users: UserService::new(SessionProvider::new(pool)),
            config,
            jwt,
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
