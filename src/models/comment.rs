use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::review::Authored;
use crate::permissions::Owned;

/// Represents the 'comments' table in the database.
#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: i64,
    #[serde(skip)]
    pub review_id: i64,
    #[serde(flatten)]
    pub body: Authored,
}

impl Owned for Comment {
    fn author_id(&self) -> i64 {
        self.body.author_id
    }
}

/// DTO for creating a new comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Comment must be between 1 and 1000 characters"
    ))]
    pub text: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Comment must be between 1 and 1000 characters"
    ))]
    pub text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub review_id: i64,
    pub author_id: i64,
    pub text: String,
}
