// src/handlers/titles.rs

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::catalog::{CreateTitleRequest, TitleFilter, UpdateTitleRequest},
    permissions::{Actor, Policy},
    services::catalog,
    state::AppState,
    utils::extract::{Json, Path, Query},
};

/// Lists titles, newest year first.
///
/// Filters: `category` and `genre` match slug substrings case-insensitively,
/// `name` matches a name substring, `year` is exact.
pub async fn list_titles(
    State(state): State<AppState>,
    Query(filter): Query<TitleFilter>,
) -> Result<impl IntoResponse, AppError> {
    let titles = catalog::list_titles(&state, &filter).await?;
    Ok(Json(titles))
}

pub async fn get_title(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let title = catalog::get_title(&state, id).await?;
    Ok(Json(title))
}

/// Creates a title. Admin only.
pub async fn create_title(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Json(payload): Json<CreateTitleRequest>,
) -> Result<impl IntoResponse, AppError> {
    Policy::ReadOnlyOrAdmin.authorize(&actor, &method)?;

    let title = catalog::create_title(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(title)))
}

pub async fn update_title(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTitleRequest>,
) -> Result<impl IntoResponse, AppError> {
    Policy::ReadOnlyOrAdmin.authorize(&actor, &method)?;

    let title = catalog::update_title(&state, id, payload).await?;
    Ok(Json(title))
}

pub async fn delete_title(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Policy::ReadOnlyOrAdmin.authorize(&actor, &method)?;

    catalog::delete_title(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
