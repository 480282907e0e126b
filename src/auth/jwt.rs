use std::time::Duration;

use anyhow::Context;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::auth::claims::Claims;
use crate::config::JwtConfig;
use crate::error::AppError;

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64).saturating_mul(60)),
        }
    }
}

impl JwtKeys {
    pub fn sign_access(&self, user_id: i64) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = TimeDuration::try_from(self.access_ttl)
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .context("access token expiry out of range")?;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

/// Extracts and validates the bearer token, yielding the user ID.
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("Invalid authentication scheme".into()))?;

        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::Unauthorized("Could not validate credentials".into())
        })?;

        Ok(AuthUser(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        keys_with_ttl(secret, issuer, audience, 5)
    }

    fn keys_with_ttl(secret: &str, issuer: &str, audience: &str, ttl_minutes: i64) -> JwtKeys {
        JwtKeys::from(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes,
        })
    }

    #[test]
    fn oversized_ttl_fails_signing_instead_of_overflowing() {
        let keys = keys_with_ttl("dev-secret", "iss", "aud", i64::MAX);
        assert_eq!(keys.access_ttl.as_secs(), u64::MAX);
        assert!(keys.sign_access(1).is_err());
    }

    #[test]
    fn sign_and_verify_access_token() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let token = keys.sign_access(42).expect("sign access");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, 5 * 60);
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good_keys = make_keys("same-secret", "good-iss", "good-aud");
        let bad_keys = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good_keys.sign_access(1).expect("sign access");
        assert!(bad_keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_other_secret() {
        let token = make_keys("one", "iss", "aud").sign_access(1).unwrap();
        assert!(make_keys("two", "iss", "aud").verify(&token).is_err());
    }

    async fn extract(keys: &JwtKeys, header: Option<&str>) -> Result<AuthUser, AppError> {
        let mut builder = Request::builder().uri("/users/me");
        if let Some(value) = header {
            builder = builder.header(axum::http::header::AUTHORIZATION, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, keys).await
    }

    #[tokio::test]
    async fn extractor_accepts_bearer_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.sign_access(9).unwrap();
        let AuthUser(user_id) = extract(&keys, Some(format!("Bearer {token}").as_str()))
            .await
            .unwrap();
        assert_eq!(user_id, 9);
    }

    #[tokio::test]
    async fn extractor_rejects_missing_or_malformed_header() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert!(matches!(
            extract(&keys, None).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            extract(&keys, Some("Basic abc")).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            extract(&keys, Some("Bearer not-a-jwt")).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
