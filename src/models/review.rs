use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::permissions::Owned;

/// Text written by a user at a point in time. Reviews and comments both
/// embed it.
#[derive(Debug, Clone, Serialize)]
pub struct Authored {
    #[serde(skip)]
    pub author_id: i64,
    /// Author's username.
    pub author: String,
    pub text: String,
    pub pub_date: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'reviews' table in the database.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: i64,
    #[serde(skip)]
    pub title_id: i64,
    #[serde(flatten)]
    pub body: Authored,
    pub score: i16,
}

impl Owned for Review {
    fn author_id(&self) -> i64 {
        self.body.author_id
    }
}

/// DTO for creating a review. Score bounds are checked by the review engine.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(length(min = 1, max = 10000))]
    pub text: String,
    pub score: i64,
}

/// DTO for a partial review update. Title and author cannot change.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(length(min = 1, max = 10000))]
    pub text: Option<String>,
    pub score: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub title_id: i64,
    pub author_id: i64,
    pub text: String,
    pub score: i16,
}
