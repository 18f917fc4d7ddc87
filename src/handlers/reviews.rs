// src/handlers/reviews.rs

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        page::PageParams,
        review::{CreateReviewRequest, UpdateReviewRequest},
    },
    permissions::{Actor, Policy},
    services::reviews,
    state::AppState,
    utils::extract::{Json, Path, Query},
};

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(title_id): Path<i64>,
    Query(page): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = reviews::list_reviews(&state, title_id, page).await?;
    Ok(Json(page))
}

pub async fn get_review(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let review = reviews::get_review(&state, title_id, review_id).await?;
    Ok(Json(review))
}

/// Posts the caller's review. One review per user per title.
pub async fn create_review(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Path(title_id): Path<i64>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    Policy::AuthorModeratorAdminOrReadOnly.authorize(&actor, &method)?;

    let review = reviews::create_review(&state, &actor, title_id, payload).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Author, moderator or admin.
pub async fn update_review(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    Policy::AuthorModeratorAdminOrReadOnly.authorize(&actor, &method)?;

    let review = reviews::update_review(&state, &actor, title_id, review_id, payload).await?;
    Ok(Json(review))
}

pub async fn delete_review(
    State(state): State<AppState>,
    actor: Actor,
    method: Method,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    Policy::AuthorModeratorAdminOrReadOnly.authorize(&actor, &method)?;

    reviews::delete_review(&state, &actor, title_id, review_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
