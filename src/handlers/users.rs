// src/handlers/users.rs

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        page::PageParams,
        user::{CreateUserRequest, UpdateUserRequest, UserListParams},
    },
    permissions::{Actor, Policy},
    services::accounts,
    state::AppState,
    utils::extract::{Json, Path, Query},
};

/// Lists users ordered by username.
/// Admin only. `?search=` matches a username exactly.
pub async fn list_users(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Query(params): Query<UserListParams>,
) -> Result<impl IntoResponse, AppError> {
    Policy::AdminOnly.authorize(&actor, &method)?;

    let page = PageParams {
        limit: params.limit,
        offset: params.offset,
    };
    let users = accounts::list_users(&state, params.search.as_deref(), page).await?;
    Ok(Json(users))
}

/// Creates a user with any role.
/// Admin only.
pub async fn create_user(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    Policy::AdminOnly.authorize(&actor, &method)?;

    let user = accounts::create_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Policy::AdminOnly.authorize(&actor, &method)?;

    let user = accounts::get_user(&state, &username).await?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Path(username): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    Policy::AdminOnly.authorize(&actor, &method)?;

    let user = accounts::update_user(&state, &username, payload).await?;
    Ok(Json(user))
}

/// Deletes a user and everything they wrote.
/// Admin only. Prevents deleting self.
pub async fn delete_user(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Policy::AdminOnly.authorize(&actor, &method)?;
    let principal = actor.require_principal()?;

    accounts::delete_user(&state, principal, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the caller's own record.
pub async fn get_me(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
) -> Result<impl IntoResponse, AppError> {
    Policy::Authenticated.authorize(&actor, &method)?;
    let principal = actor.require_principal()?;

    let user = accounts::get_profile(&state, principal).await?;
    Ok(Json(user))
}

/// Updates the caller's own record. A `role` in the body is ignored.
pub async fn update_me(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    Policy::Authenticated.authorize(&actor, &method)?;
    let principal = actor.require_principal()?;

    let user = accounts::update_profile(&state, principal, payload).await?;
    Ok(Json(user))
}
