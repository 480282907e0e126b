use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{jwt::AuthUser, services::current_active_user},
    error::AppResult,
    extractors::{JsonBody, PathParam, QueryParams},
    state::AppState,
    users::dto::{DeleteResponse, SearchParams, UserCreate, UserResponse, UserUpdate},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/", get(list_users).post(create_user))
        .route("/get_all_users/", get(list_users))
        .route("/users/search", get(search_users))
        .route("/users/search/", get(search_users))
        .route("/users/me", get(read_me))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(state.users.get_user(id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<UserCreate>,
) -> AppResult<(StatusCode, HeaderMap, Json<UserResponse>)> {
    let user = state.users.create_user(payload).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/users/{}", user.id).parse() {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
    JsonBody(payload): JsonBody<UserUpdate>,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(state.users.update_user(id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> AppResult<Json<DeleteResponse>> {
    Ok(Json(state.users.delete_user(id).await?))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    Ok(Json(state.users.list_users().await?))
}

#[instrument(skip(state))]
pub async fn search_users(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<SearchParams>,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(state.users.search_by_name(params.name.as_deref()).await?))
}

#[instrument(skip(state))]
pub async fn read_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(current_active_user(&state.users, user_id).await?))
}
