// src/models/catalog.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::{NAME_MAX_LENGTH, SLUG_MAX_LENGTH};
use crate::models::page::PageParams;

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-a-zA-Z0-9_]+\z").unwrap_or_else(|e| panic!("invalid slug pattern: {e}"))
});

/// A name + slug pair. Categories and genres share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Term {
    #[serde(skip)]
    pub id: i64,
    pub name: String,
    pub slug: String,
}

pub type Category = Term;
pub type Genre = Term;

/// Which vocabulary a [`Term`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermKind {
    Category,
    Genre,
}

impl TermKind {
    pub fn table(&self) -> &'static str {
        match self {
            TermKind::Category => "categories",
            TermKind::Genre => "genres",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TermKind::Category => "Category",
            TermKind::Genre => "Genre",
        }
    }
}

/// DTO for creating a category or a genre.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTermRequest {
    #[validate(length(min = 1, max = NAME_MAX_LENGTH))]
    pub name: String,
    #[validate(length(min = 1, max = SLUG_MAX_LENGTH), custom(function = validate_slug))]
    pub slug: String,
}

/// Query parameters for category/genre lists.
#[derive(Debug, Deserialize)]
pub struct TermListParams {
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TermListParams {
    pub fn page(&self) -> PageParams {
        PageParams {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// A title as stored, with its rating inputs aggregated from reviews.
#[derive(Debug, Clone)]
pub struct TitleRecord {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category: Option<Category>,
    pub genres: Vec<Genre>,
    pub score_sum: i64,
    pub review_count: i64,
}

/// Read shape of a title.
#[derive(Debug, Serialize)]
pub struct TitleResponse {
    pub id: i64,
    pub name: String,
    pub year: i32,
    /// Mean review score, `null` until the first review.
    pub rating: Option<f64>,
    pub description: String,
    pub genre: Vec<Genre>,
    pub category: Option<Category>,
}

/// DTO for creating a title. Category and genres are referenced by slug.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTitleRequest {
    #[validate(length(min = 1, max = NAME_MAX_LENGTH))]
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, message = "At least one genre is required."))]
    pub genre: Vec<String>,
    pub category: String,
}

/// DTO for a partial title update.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTitleRequest {
    #[validate(length(min = 1, max = NAME_MAX_LENGTH))]
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "At least one genre is required."))]
    pub genre: Option<Vec<String>>,
    pub category: Option<String>,
}

/// Query parameters for listing titles.
#[derive(Debug, Default, Deserialize)]
pub struct TitleFilter {
    /// Substring of the category slug (case-insensitive).
    pub category: Option<String>,
    /// Substring of a genre slug (case-insensitive).
    pub genre: Option<String>,
    /// Substring of the title name.
    pub name: Option<String>,
    pub year: Option<i32>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TitleFilter {
    pub fn page(&self) -> PageParams {
        PageParams {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// Insert payload with references already resolved to ids.
#[derive(Debug, Clone)]
pub struct NewTitle {
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category_id: i64,
    pub genre_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct TitleChanges {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub genre_ids: Option<Vec<i64>>,
}

fn validate_slug(slug: &str) -> Result<(), validator::ValidationError> {
    if !SLUG_RE.is_match(slug) {
        return Err(validator::ValidationError::new("invalid_slug")
            .with_message("Slug may contain only latin letters, digits, '-' and '_'".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_rules() {
        let ok = CreateTermRequest {
            name: "Science fiction".into(),
            slug: "sci-fi_2".into(),
        };
        assert!(ok.validate().is_ok());

        let spaced = CreateTermRequest {
            name: "Drama".into(),
            slug: "dra ma".into(),
        };
        assert!(spaced.validate().is_err());

        let long = CreateTermRequest {
            name: "Drama".into(),
            slug: "x".repeat(51),
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn empty_genre_list_is_rejected() {
        let request = CreateTitleRequest {
            name: "Solaris".into(),
            year: 1961,
            description: String::new(),
            genre: vec![],
            category: "books".into(),
        };
        assert!(request.validate().is_err());
    }
}
