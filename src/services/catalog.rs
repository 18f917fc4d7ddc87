// src/services/catalog.rs

use std::collections::BTreeSet;

use chrono::Datelike;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        catalog::{
            CreateTermRequest, CreateTitleRequest, NewTitle, Term, TermKind, TermListParams,
            TitleChanges, TitleFilter, TitleRecord, TitleResponse, UpdateTitleRequest,
        },
        page::Page,
    },
    services::reviews::compute_rating,
    state::AppState,
    utils::html::clean_html,
};

/// A title may not be dated later than the current calendar year.
pub fn validate_year(year: i32) -> Result<(), AppError> {
    let current = chrono::Utc::now().year();
    if year > current {
        return Err(AppError::year_in_future(year, current));
    }
    Ok(())
}

/// Read view of a stored title, with its rating derived from the aggregates.
pub fn present(record: TitleRecord) -> TitleResponse {
    TitleResponse {
        id: record.id,
        name: record.name,
        year: record.year,
        rating: compute_rating(record.score_sum, record.review_count),
        description: record.description,
        genre: record.genres,
        category: record.category,
    }
}

async fn resolve_category(state: &AppState, slug: &str) -> Result<Term, AppError> {
    state
        .catalog
        .find_terms(TermKind::Category, &[slug.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::category_not_found(slug))
}

/// Resolves genre slugs to ids. Repeated slugs collapse; every slug must exist.
async fn resolve_genres(state: &AppState, slugs: &[String]) -> Result<Vec<i64>, AppError> {
    let wanted: Vec<String> = slugs
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let found = state.catalog.find_terms(TermKind::Genre, &wanted).await?;

    if let Some(missing) = wanted
        .iter()
        .find(|slug| !found.iter().any(|g| &g.slug == *slug))
    {
        return Err(AppError::genre_not_found(missing));
    }

    Ok(found.into_iter().map(|g| g.id).collect())
}

pub async fn list_titles(
    state: &AppState,
    filter: &TitleFilter,
) -> Result<Page<TitleResponse>, AppError> {
    Ok(state.catalog.list_titles(filter).await?.map(present))
}

pub async fn get_title(state: &AppState, id: i64) -> Result<TitleResponse, AppError> {
    state
        .catalog
        .find_title(id)
        .await?
        .map(present)
        .ok_or_else(AppError::title_not_found)
}

pub async fn create_title(
    state: &AppState,
    payload: CreateTitleRequest,
) -> Result<TitleResponse, AppError> {
    payload.validate()?;
    validate_year(payload.year)?;
    let category = resolve_category(state, &payload.category).await?;
    let genre_ids = resolve_genres(state, &payload.genre).await?;

    let id = state
        .catalog
        .create_title(NewTitle {
            name: payload.name,
            year: payload.year,
            description: clean_html(&payload.description),
            category_id: category.id,
            genre_ids,
        })
        .await?;

    tracing::info!(title_id = id, "title created");
    get_title(state, id).await
}

/// Partial update: only supplied fields are validated and changed.
pub async fn update_title(
    state: &AppState,
    id: i64,
    payload: UpdateTitleRequest,
) -> Result<TitleResponse, AppError> {
    if state.catalog.find_title(id).await?.is_none() {
        return Err(AppError::title_not_found());
    }

    payload.validate()?;
    if let Some(year) = payload.year {
        validate_year(year)?;
    }
    let category_id = match &payload.category {
        Some(slug) => Some(resolve_category(state, slug).await?.id),
        None => None,
    };
    let genre_ids = match &payload.genre {
        Some(slugs) => Some(resolve_genres(state, slugs).await?),
        None => None,
    };

    let changes = TitleChanges {
        name: payload.name,
        year: payload.year,
        description: payload.description.as_deref().map(clean_html),
        category_id,
        genre_ids,
    };
    if !state.catalog.update_title(id, changes).await? {
        return Err(AppError::title_not_found());
    }

    get_title(state, id).await
}

pub async fn delete_title(state: &AppState, id: i64) -> Result<(), AppError> {
    if !state.catalog.delete_title(id).await? {
        return Err(AppError::title_not_found());
    }
    tracing::info!(title_id = id, "title deleted");
    Ok(())
}

pub async fn list_terms(
    state: &AppState,
    kind: TermKind,
    params: &TermListParams,
) -> Result<Page<Term>, AppError> {
    state
        .catalog
        .list_terms(kind, params.search.as_deref(), params.page())
        .await
}

pub async fn create_term(
    state: &AppState,
    kind: TermKind,
    payload: CreateTermRequest,
) -> Result<Term, AppError> {
    payload.validate()?;
    let term = state
        .catalog
        .create_term(kind, &payload.name, &payload.slug)
        .await?;
    tracing::info!(kind = kind.label(), slug = %term.slug, "term created");
    Ok(term)
}

pub async fn delete_term(state: &AppState, kind: TermKind, slug: &str) -> Result<(), AppError> {
    if !state.catalog.delete_term(kind, slug).await? {
        return Err(AppError::term_not_found(kind.label()));
    }
    tracing::info!(kind = kind.label(), %slug, "term deleted");
    Ok(())
}
