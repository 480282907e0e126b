//! Application error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::users::repo::RepoError;
use crate::validation::ValidationError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or invalid input (422); never reaches the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Unauthorized(_) => "unauthorized",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(_) => Self::NotFound("User does not exist!".into()),
            RepoError::Conflict(_) => Self::Conflict("User already exists!".into()),
            RepoError::Db(e) => Self::Internal(anyhow::Error::new(e).context("user store")),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal(anyhow::Error::new(e).context("database session"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            Self::Internal(e) => {
                // Log the actual error, return generic message
                error!(error = ?e, "internal error");
                "an internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let headers = match &self {
            Self::Unauthorized(_) => Some([(axum::http::header::WWW_AUTHENTICATE, "Bearer")]),
            _ => None,
        };
        let body = Json(json!({ "error": self.kind(), "detail": detail }));

        match headers {
            Some(headers) => (status, headers, body).into_response(),
            None => (status, body).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_422() {
        let err = AppError::Validation(ValidationError::Empty { field: "name" });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["detail"], "name cannot be empty");
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let response = AppError::NotFound("User not found!".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["detail"], "User not found!");
    }

    #[tokio::test]
    async fn unauthorized_sets_challenge_header() {
        let response = AppError::Unauthorized("Inactive user".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(axum::http::header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let response = AppError::Internal(anyhow::anyhow!("disk on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "an internal error occurred");
    }

    #[test]
    fn repo_errors_map_to_http_variants() {
        assert!(matches!(
            AppError::from(RepoError::NotFound(1)),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(RepoError::Conflict("g@x.com".into())),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(RepoError::Db(sqlx::Error::RowNotFound)),
            AppError::Internal(_)
        ));
    }
}
