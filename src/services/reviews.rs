// src/services/reviews.rs

use axum::http::Method;
use validator::Validate;

use crate::{
    config::{MAX_SCORE, MIN_SCORE},
    error::AppError,
    models::{
        comment::{Comment, CreateCommentRequest, NewComment, UpdateCommentRequest},
        page::{Page, PageParams},
        review::{CreateReviewRequest, NewReview, Review, UpdateReviewRequest},
    },
    permissions::{Actor, Policy},
    state::AppState,
    utils::html::clean_html,
};

const POLICY: Policy = Policy::AuthorModeratorAdminOrReadOnly;

/// Mean review score rounded half away from zero to two decimals.
/// `None` when the title has no reviews.
pub fn compute_rating(score_sum: i64, review_count: i64) -> Option<f64> {
    if review_count <= 0 {
        return None;
    }
    let mean = score_sum as f64 / review_count as f64;
    Some((mean * 100.0).round() / 100.0)
}

fn checked_score(score: i64) -> Result<i16, AppError> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(AppError::score_out_of_range(score));
    }
    i16::try_from(score).map_err(|_| AppError::score_out_of_range(score))
}

async fn ensure_title(state: &AppState, title_id: i64) -> Result<(), AppError> {
    if state.catalog.find_title(title_id).await?.is_none() {
        return Err(AppError::title_not_found());
    }
    Ok(())
}

/// Loads a review through its title, so a review id under the wrong title is
/// not found.
async fn load_review(state: &AppState, title_id: i64, review_id: i64) -> Result<Review, AppError> {
    ensure_title(state, title_id).await?;
    state
        .reviews
        .find_review(title_id, review_id)
        .await?
        .ok_or_else(AppError::review_not_found)
}

async fn load_comment(
    state: &AppState,
    title_id: i64,
    review_id: i64,
    comment_id: i64,
) -> Result<Comment, AppError> {
    load_review(state, title_id, review_id).await?;
    state
        .reviews
        .find_comment(review_id, comment_id)
        .await?
        .ok_or_else(AppError::comment_not_found)
}

pub async fn list_reviews(
    state: &AppState,
    title_id: i64,
    page: PageParams,
) -> Result<Page<Review>, AppError> {
    ensure_title(state, title_id).await?;
    state.reviews.list_reviews(title_id, page).await
}

pub async fn get_review(state: &AppState, title_id: i64, review_id: i64) -> Result<Review, AppError> {
    load_review(state, title_id, review_id).await
}

/// Creates the caller's review of a title.
///
/// Checks run in order: title exists, payload, score range, no earlier review
/// by the same author. The store repeats the uniqueness check atomically, so
/// two racing requests still yield one review and one conflict.
pub async fn create_review(
    state: &AppState,
    actor: &Actor,
    title_id: i64,
    payload: CreateReviewRequest,
) -> Result<Review, AppError> {
    let principal = actor.require_principal()?;
    ensure_title(state, title_id).await?;
    payload.validate()?;
    let score = checked_score(payload.score)?;

    if state
        .reviews
        .find_review_by_author(title_id, principal.id)
        .await?
        .is_some()
    {
        return Err(AppError::duplicate_review());
    }

    let review = state
        .reviews
        .create_review(NewReview {
            title_id,
            author_id: principal.id,
            text: clean_html(&payload.text),
            score,
        })
        .await?;

    tracing::info!(title_id, review_id = review.id, author = %principal.username, "review created");
    Ok(review)
}

pub async fn update_review(
    state: &AppState,
    actor: &Actor,
    title_id: i64,
    review_id: i64,
    payload: UpdateReviewRequest,
) -> Result<Review, AppError> {
    let review = load_review(state, title_id, review_id).await?;
    POLICY.authorize_object(actor, &Method::PATCH, &review)?;

    payload.validate()?;
    let score = payload.score.map(checked_score).transpose()?;

    state
        .reviews
        .update_review(review.id, payload.text.as_deref().map(clean_html), score)
        .await?
        .ok_or_else(AppError::review_not_found)
}

pub async fn delete_review(
    state: &AppState,
    actor: &Actor,
    title_id: i64,
    review_id: i64,
) -> Result<(), AppError> {
    let review = load_review(state, title_id, review_id).await?;
    POLICY.authorize_object(actor, &Method::DELETE, &review)?;

    if !state.reviews.delete_review(review.id).await? {
        return Err(AppError::review_not_found());
    }
    tracing::info!(title_id, review_id, "review deleted");
    Ok(())
}

pub async fn list_comments(
    state: &AppState,
    title_id: i64,
    review_id: i64,
    page: PageParams,
) -> Result<Page<Comment>, AppError> {
    load_review(state, title_id, review_id).await?;
    state.reviews.list_comments(review_id, page).await
}

pub async fn get_comment(
    state: &AppState,
    title_id: i64,
    review_id: i64,
    comment_id: i64,
) -> Result<Comment, AppError> {
    load_comment(state, title_id, review_id, comment_id).await
}

pub async fn create_comment(
    state: &AppState,
    actor: &Actor,
    title_id: i64,
    review_id: i64,
    payload: CreateCommentRequest,
) -> Result<Comment, AppError> {
    let principal = actor.require_principal()?;
    load_review(state, title_id, review_id).await?;
    payload.validate()?;

    let comment = state
        .reviews
        .create_comment(NewComment {
            review_id,
            author_id: principal.id,
            text: clean_html(&payload.text),
        })
        .await?;

    tracing::debug!(review_id, comment_id = comment.id, "comment created");
    Ok(comment)
}

pub async fn update_comment(
    state: &AppState,
    actor: &Actor,
    title_id: i64,
    review_id: i64,
    comment_id: i64,
    payload: UpdateCommentRequest,
) -> Result<Comment, AppError> {
    let comment = load_comment(state, title_id, review_id, comment_id).await?;
    POLICY.authorize_object(actor, &Method::PATCH, &comment)?;
    payload.validate()?;

    let Some(text) = payload.text else {
        return Ok(comment);
    };

    state
        .reviews
        .update_comment(comment.id, clean_html(&text))
        .await?
        .ok_or_else(AppError::comment_not_found)
}

pub async fn delete_comment(
    state: &AppState,
    actor: &Actor,
    title_id: i64,
    review_id: i64,
    comment_id: i64,
) -> Result<(), AppError> {
    let comment = load_comment(state, title_id, review_id, comment_id).await?;
    POLICY.authorize_object(actor, &Method::DELETE, &comment)?;

    if !state.reviews.delete_comment(comment.id).await? {
        return Err(AppError::comment_not_found());
    }
    Ok(())
}
