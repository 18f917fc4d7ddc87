//! Persistence ports.
//!
//! Handlers and services talk to storage only through these traits. Two
//! implementations exist: [`postgres::PgStore`] for deployments and
//! [`memory::MemoryStore`] for local runs and tests. Both enforce the same
//! uniqueness rules and cascades, so either can back the API.

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        catalog::{NewTitle, Term, TermKind, TitleChanges, TitleFilter, TitleRecord},
        comment::{Comment, NewComment},
        page::{Page, PageParams},
        review::{NewReview, Review},
        user::{NewUser, User, UserChanges},
    },
};

pub mod memory;
pub mod postgres;

/// Identity store.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Users ordered by username. `search` matches the username exactly.
    async fn list_users(&self, search: Option<&str>, page: PageParams) -> Result<Page<User>, AppError>;

    /// Fails with `Conflict` when the username or email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    /// Returns `None` when the user does not exist.
    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError>;

    /// Removes the user together with their reviews and comments.
    async fn delete_user(&self, id: i64) -> Result<bool, AppError>;

    /// Replaces any pending code.
    async fn set_confirmation_code(&self, id: i64, code: &str) -> Result<(), AppError>;

    /// Clears the pending code and marks the account confirmed, but only when
    /// the stored code equals `code`. Check and clear happen in one step, so
    /// a code can be consumed at most once.
    async fn consume_confirmation_code(&self, id: i64, code: &str) -> Result<Option<User>, AppError>;
}

/// Catalog store: categories, genres and titles.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Terms ordered by name. `search` is a case-insensitive name substring.
    async fn list_terms(
        &self,
        kind: TermKind,
        search: Option<&str>,
        page: PageParams,
    ) -> Result<Page<Term>, AppError>;

    /// Terms whose slug is in `slugs`. Unknown slugs are simply absent.
    async fn find_terms(&self, kind: TermKind, slugs: &[String]) -> Result<Vec<Term>, AppError>;

    /// Fails with `Conflict` when the slug is taken.
    async fn create_term(&self, kind: TermKind, name: &str, slug: &str) -> Result<Term, AppError>;

    /// Deleting a category leaves its titles uncategorised; deleting a genre
    /// unlinks it from every title.
    async fn delete_term(&self, kind: TermKind, slug: &str) -> Result<bool, AppError>;

    /// Titles ordered by year descending, then name, then id.
    async fn list_titles(&self, filter: &TitleFilter) -> Result<Page<TitleRecord>, AppError>;

    async fn find_title(&self, id: i64) -> Result<Option<TitleRecord>, AppError>;

    async fn create_title(&self, title: NewTitle) -> Result<i64, AppError>;

    async fn update_title(&self, id: i64, changes: TitleChanges) -> Result<bool, AppError>;

    /// Removes the title with its reviews and their comments.
    async fn delete_title(&self, id: i64) -> Result<bool, AppError>;
}

/// Review and comment store.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Newest first.
    async fn list_reviews(&self, title_id: i64, page: PageParams) -> Result<Page<Review>, AppError>;

    async fn find_review(&self, title_id: i64, review_id: i64) -> Result<Option<Review>, AppError>;

    async fn find_review_by_author(
        &self,
        title_id: i64,
        author_id: i64,
    ) -> Result<Option<Review>, AppError>;

    /// The (author, title) pair is unique. A duplicate, including one that
    /// races a concurrent insert, fails with the `duplicate_review` conflict.
    /// A missing title fails with `title_not_found`.
    async fn create_review(&self, review: NewReview) -> Result<Review, AppError>;

    async fn update_review(
        &self,
        review_id: i64,
        text: Option<String>,
        score: Option<i16>,
    ) -> Result<Option<Review>, AppError>;

    /// Removes the review and its comments.
    async fn delete_review(&self, review_id: i64) -> Result<bool, AppError>;

    /// Newest first.
    async fn list_comments(&self, review_id: i64, page: PageParams) -> Result<Page<Comment>, AppError>;

    async fn find_comment(&self, review_id: i64, comment_id: i64) -> Result<Option<Comment>, AppError>;

    /// A missing review fails with `review_not_found`.
    async fn create_comment(&self, comment: NewComment) -> Result<Comment, AppError>;

    async fn update_comment(&self, comment_id: i64, text: String) -> Result<Option<Comment>, AppError>;

    async fn delete_comment(&self, comment_id: i64) -> Result<bool, AppError>;
}
