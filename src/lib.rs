//! HTTP CRUD service over an embedded SQLite `users` table.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod state;
pub mod users;
pub mod validation;

pub use app::{build_app, serve};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use state::AppState;
