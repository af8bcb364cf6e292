use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    acronyms::Acronym,
    auth::{authenticate, token::Token, BasicAuth, BearerAuth, Principal},
    error::AppError,
    state::AppState,
    users::{
        dto::{CreateUserRequest, PublicUser, UserWithAcronyms},
        services,
    },
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/acronyms", get(list_users_with_acronyms))
        .route("/users/:id", get(get_user))
        .route("/users/:id/acronyms", get(get_user_acronyms))
}

/// Basic credentials, login only.
pub fn login_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            state,
            authenticate::<BasicAuth>,
        ))
}

/// Bearer token required.
pub fn write_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:id", delete(delete_user))
        .route("/users/:id/force", delete(force_delete_user))
        .route("/users/:id/restore", post(restore_user))
        .route_layer(middleware::from_fn_with_state(
            state,
            authenticate::<BearerAuth>,
        ))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<PublicUser>>, AppError> {
    Ok(Json(services::list_users(&state).await?))
}

#[instrument(skip(state))]
pub async fn list_users_with_acronyms(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserWithAcronyms>>, AppError> {
    Ok(Json(services::list_users_with_acronyms(&state).await?))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, AppError> {
    Ok(Json(services::get_user(&state, id).await?))
}

#[instrument(skip(state))]
pub async fn get_user_acronyms(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Acronym>>, AppError> {
    Ok(Json(services::user_acronyms(&state, id).await?))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn login(
    State(state): State<AppState>,
    Principal(user): Principal,
) -> Result<Json<Token>, AppError> {
    Ok(Json(services::login(&state, &user).await?))
}

#[instrument(skip_all, fields(caller = %caller.id, username = %payload.username))]
pub async fn create_user(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let user = services::create_user(&state, &caller, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip_all, fields(caller = %caller.id, target = %id))]
pub async fn delete_user(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    services::soft_delete_user(&state, &caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all, fields(caller = %caller.id, target = %id))]
pub async fn force_delete_user(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    services::force_delete_user(&state, &caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all, fields(caller = %caller.id, target = %id))]
pub async fn restore_user(
    State(state): State<AppState>,
    Principal(caller): Principal,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    services::restore_user(&state, &caller, id).await?;
    Ok(StatusCode::OK)
}
