// src/handlers/catalog.rs

//! Categories and genres. Both are flat name/slug vocabularies managed by
//! admins and readable by anyone.

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::catalog::{CreateTermRequest, TermKind, TermListParams},
    permissions::{Actor, Policy},
    services::catalog,
    state::AppState,
    utils::extract::{Json, Path, Query},
};

async fn list(
    state: AppState,
    kind: TermKind,
    params: TermListParams,
) -> Result<impl IntoResponse, AppError> {
    let terms = catalog::list_terms(&state, kind, &params).await?;
    Ok(Json(terms))
}

async fn create(
    state: AppState,
    actor: Actor,
    method: Method,
    kind: TermKind,
    payload: CreateTermRequest,
) -> Result<impl IntoResponse, AppError> {
    Policy::ReadOnlyOrAdmin.authorize(&actor, &method)?;
    let term = catalog::create_term(&state, kind, payload).await?;
    Ok((StatusCode::CREATED, Json(term)))
}

async fn delete(
    state: AppState,
    actor: Actor,
    method: Method,
    kind: TermKind,
    slug: String,
) -> Result<impl IntoResponse, AppError> {
    Policy::ReadOnlyOrAdmin.authorize(&actor, &method)?;
    catalog::delete_term(&state, kind, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<TermListParams>,
) -> Result<impl IntoResponse, AppError> {
    list(state, TermKind::Category, params).await
}

pub async fn create_category(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Json(payload): Json<CreateTermRequest>,
) -> Result<impl IntoResponse, AppError> {
    create(state, actor, method, TermKind::Category, payload).await
}

pub async fn delete_category(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    delete(state, actor, method, TermKind::Category, slug).await
}

pub async fn list_genres(
    State(state): State<AppState>,
    Query(params): Query<TermListParams>,
) -> Result<impl IntoResponse, AppError> {
    list(state, TermKind::Genre, params).await
}

pub async fn create_genre(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Json(payload): Json<CreateTermRequest>,
) -> Result<impl IntoResponse, AppError> {
    create(state, actor, method, TermKind::Genre, payload).await
}

pub async fn delete_genre(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    delete(state, actor, method, TermKind::Genre, slug).await
}
