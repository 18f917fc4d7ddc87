// src/handlers/comments.rs

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        comment::{CreateCommentRequest, UpdateCommentRequest},
        page::PageParams,
    },
    permissions::{Actor, Policy},
    services::reviews,
    state::AppState,
    utils::extract::{Json, Path, Query},
};

/// Lists comments on a review, newest first.
pub async fn list_comments(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = reviews::list_comments(&state, title_id, review_id, page).await?;
    Ok(Json(page))
}

pub async fn get_comment(
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let comment = reviews::get_comment(&state, title_id, review_id, comment_id).await?;
    Ok(Json(comment))
}

/// Adds a comment to a review. Requires a signed-in caller.
pub async fn create_comment(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    Policy::AuthorModeratorAdminOrReadOnly.authorize(&actor, &method)?;

    let comment = reviews::create_comment(&state, &actor, title_id, review_id, payload).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    Policy::AuthorModeratorAdminOrReadOnly.authorize(&actor, &method)?;

    let comment =
        reviews::update_comment(&state, &actor, title_id, review_id, comment_id, payload).await?;
    Ok(Json(comment))
}

/// Author, moderator or admin.
pub async fn delete_comment(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    Policy::AuthorModeratorAdminOrReadOnly.authorize(&actor, &method)?;

    reviews::delete_comment(&state, &actor, title_id, review_id, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
