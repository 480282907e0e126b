use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, applying defaults for
    /// everything except `JWT_SECRET`.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://dev.db".into());
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?;

        let jwt = JwtConfig {
            secret: lookup("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "userdesk".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "userdesk-users".into()),
            ttl_minutes: parse_or(&lookup, "JWT_TTL_MINUTES", 30)?,
        };

        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&lookup, "APP_PORT", 8080)?;

        Ok(Self {
            database_url,
            max_connections,
            jwt,
            host,
            port,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
