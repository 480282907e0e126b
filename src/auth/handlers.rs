use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument};

use crate::{
    auth::{dto::{LoginForm, TokenResponse}, services::authenticate},
    error::AppResult,
    extractors::FormBody,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/token", post(login))
}

/// OAuth2 password flow: exchanges email + password for an access token.
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    FormBody(form): FormBody<LoginForm>,
) -> AppResult<Json<TokenResponse>> {
    let user = authenticate(&state.users, &form.username, &form.password).await?;
    let access_token = state.jwt.sign_access(user.id)?;

    info!(user_id = user.id, "access token issued");
    Ok(Json(TokenResponse::bearer(access_token)))
}
