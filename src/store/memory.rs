//! In-memory store used when no database is configured, and by the tests.
//!
//! All state sits behind one async mutex, so every operation, including the
//! duplicate-review check with its insert and the confirmation-code
//! check-and-clear, runs as a single atomic step.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    error::AppError,
    models::{
        catalog::{NewTitle, Term, TermKind, TitleChanges, TitleFilter, TitleRecord},
        comment::{Comment, NewComment},
        page::{Page, PageParams},
        review::{Authored, NewReview, Review},
        user::{NewUser, User, UserChanges},
    },
    store::{CatalogStore, ReviewStore, UserStore},
};

#[derive(Debug, Clone)]
struct TitleRow {
    id: i64,
    name: String,
    year: i32,
    description: String,
    category_id: Option<i64>,
    genre_ids: BTreeSet<i64>,
}

#[derive(Debug, Clone)]
struct EntryRow {
    id: i64,
    parent_id: i64,
    author_id: i64,
    text: String,
    pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ReviewRow {
    entry: EntryRow,
    score: i16,
}

#[derive(Debug, Default)]
struct Tables {
    last_id: i64,
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Term>,
    genres: BTreeMap<i64, Term>,
    titles: BTreeMap<i64, TitleRow>,
    reviews: BTreeMap<i64, ReviewRow>,
    comments: BTreeMap<i64, EntryRow>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn terms(&self, kind: TermKind) -> &BTreeMap<i64, Term> {
        match kind {
            TermKind::Category => &self.categories,
            TermKind::Genre => &self.genres,
        }
    }

    fn terms_mut(&mut self, kind: TermKind) -> &mut BTreeMap<i64, Term> {
        match kind {
            TermKind::Category => &mut self.categories,
            TermKind::Genre => &mut self.genres,
        }
    }

    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn authored(&self, entry: &EntryRow) -> Authored {
        Authored {
            author_id: entry.author_id,
            author: self
                .users
                .get(&entry.author_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
            text: entry.text.clone(),
            pub_date: entry.pub_date,
        }
    }

    fn review(&self, row: &ReviewRow) -> Review {
        Review {
            id: row.entry.id,
            title_id: row.entry.parent_id,
            body: self.authored(&row.entry),
            score: row.score,
        }
    }

    fn comment(&self, row: &EntryRow) -> Comment {
        Comment {
            id: row.id,
            review_id: row.parent_id,
            body: self.authored(row),
        }
    }

    fn title(&self, row: &TitleRow) -> TitleRecord {
        let (score_sum, review_count) = self
            .reviews
            .values()
            .filter(|r| r.entry.parent_id == row.id)
            .fold((0i64, 0i64), |(sum, n), r| (sum + i64::from(r.score), n + 1));
        let mut genres: Vec<Term> = row
            .genre_ids
            .iter()
            .filter_map(|id| self.genres.get(id).cloned())
            .collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name));

        TitleRecord {
            id: row.id,
            name: row.name.clone(),
            year: row.year,
            description: row.description.clone(),
            category: row.category_id.and_then(|id| self.categories.get(&id).cloned()),
            genres,
            score_sum,
            review_count,
        }
    }

    fn remove_review(&mut self, review_id: i64) -> bool {
        let removed = self.reviews.remove(&review_id).is_some();
        if removed {
            self.comments.retain(|_, c| c.parent_id != review_id);
        }
        removed
    }
}

/// Newest first, id breaking ties.
fn newest_first(a: &EntryRow, b: &EntryRow) -> std::cmp::Ordering {
    b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id))
}

fn icontains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self, search: Option<&str>, page: PageParams) -> Result<Page<User>, AppError> {
        let tables = self.tables.lock().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| search.is_none_or(|s| u.username == s))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(Page::from_sorted(users, page))
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.username_taken(&user.username, None) {
            return Err(AppError::conflict("username_taken", "Username is already taken"));
        }
        if tables.email_taken(&user.email, None) {
            return Err(AppError::conflict("email_taken", "Email is already registered"));
        }

        let id = tables.next_id();
        let created = User {
            id,
            username: user.username,
            email: user.email,
            role: user.role,
            is_staff: user.is_staff,
            confirmation_code: user.confirmation_code,
            is_confirmed: false,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            created_at: Utc::now(),
        };
        tables.users.insert(id, created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&id) {
            return Ok(None);
        }
        if let Some(username) = &changes.username {
            if tables.username_taken(username, Some(id)) {
                return Err(AppError::conflict("username_taken", "Username is already taken"));
            }
        }
        if let Some(email) = &changes.email {
            if tables.email_taken(email, Some(id)) {
                return Err(AppError::conflict("email_taken", "Email is already registered"));
            }
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(bio) = changes.bio {
            user.bio = bio;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        let authored: Vec<i64> = tables
            .reviews
            .values()
            .filter(|r| r.entry.author_id == id)
            .map(|r| r.entry.id)
            .collect();
        for review_id in authored {
            tables.remove_review(review_id);
        }
        tables.comments.retain(|_, c| c.author_id != id);
        Ok(true)
    }

    async fn set_confirmation_code(&self, id: i64, code: &str) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        let user = tables.users.get_mut(&id).ok_or_else(AppError::user_not_found)?;
        user.confirmation_code = Some(code.to_string());
        Ok(())
    }

    async fn consume_confirmation_code(&self, id: i64, code: &str) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if user.confirmation_code.as_deref() != Some(code) {
            return Ok(None);
        }
        user.confirmation_code = None;
        user.is_confirmed = true;
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_terms(
        &self,
        kind: TermKind,
        search: Option<&str>,
        page: PageParams,
    ) -> Result<Page<Term>, AppError> {
        let tables = self.tables.lock().await;
        let mut terms: Vec<Term> = tables
            .terms(kind)
            .values()
            .filter(|t| search.is_none_or(|s| icontains(&t.name, s)))
            .cloned()
            .collect();
        terms.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(Page::from_sorted(terms, page))
    }

    async fn find_terms(&self, kind: TermKind, slugs: &[String]) -> Result<Vec<Term>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .terms(kind)
            .values()
            .filter(|t| slugs.contains(&t.slug))
            .cloned()
            .collect())
    }

    async fn create_term(&self, kind: TermKind, name: &str, slug: &str) -> Result<Term, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.terms(kind).values().any(|t| t.slug == slug) {
            return Err(AppError::conflict(
                "slug_taken",
                format!("{} with slug '{}' already exists", kind.label(), slug),
            ));
        }
        let id = tables.next_id();
        let term = Term {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
        };
        tables.terms_mut(kind).insert(id, term.clone());
        Ok(term)
    }

    async fn delete_term(&self, kind: TermKind, slug: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(id) = tables
            .terms(kind)
            .values()
            .find(|t| t.slug == slug)
            .map(|t| t.id)
        else {
            return Ok(false);
        };
        tables.terms_mut(kind).remove(&id);
        for title in tables.titles.values_mut() {
            match kind {
                TermKind::Category if title.category_id == Some(id) => title.category_id = None,
                TermKind::Genre => {
                    title.genre_ids.remove(&id);
                }
                TermKind::Category => {}
            }
        }
        Ok(true)
    }

    async fn list_titles(&self, filter: &TitleFilter) -> Result<Page<TitleRecord>, AppError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<&TitleRow> = tables
            .titles
            .values()
            .filter(|t| {
                filter.category.as_deref().is_none_or(|needle| {
                    t.category_id
                        .and_then(|id| tables.categories.get(&id))
                        .is_some_and(|c| icontains(&c.slug, needle))
                })
            })
            .filter(|t| {
                filter.genre.as_deref().is_none_or(|needle| {
                    t.genre_ids
                        .iter()
                        .filter_map(|id| tables.genres.get(id))
                        .any(|g| icontains(&g.slug, needle))
                })
            })
            .filter(|t| filter.name.as_deref().is_none_or(|needle| t.name.contains(needle)))
            .filter(|t| filter.year.is_none_or(|year| t.year == year))
            .collect();
        rows.sort_by(|a, b| {
            b.year
                .cmp(&a.year)
                .then_with(|| a.name.cmp(&b.name))
                .then(a.id.cmp(&b.id))
        });

        let records = rows.into_iter().map(|row| tables.title(row)).collect();
        Ok(Page::from_sorted(records, filter.page()))
    }

    async fn find_title(&self, id: i64) -> Result<Option<TitleRecord>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.titles.get(&id).map(|row| tables.title(row)))
    }

    async fn create_title(&self, title: NewTitle) -> Result<i64, AppError> {
        let mut tables = self.tables.lock().await;
        if !tables.categories.contains_key(&title.category_id) {
            return Err(AppError::validation("category", "Category no longer exists"));
        }
        let id = tables.next_id();
        let row = TitleRow {
            id,
            name: title.name,
            year: title.year,
            description: title.description,
            category_id: Some(title.category_id),
            genre_ids: title
                .genre_ids
                .into_iter()
                .filter(|g| tables.genres.contains_key(g))
                .collect(),
        };
        tables.titles.insert(id, row);
        Ok(id)
    }

    async fn update_title(&self, id: i64, changes: TitleChanges) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let genre_ids: Option<BTreeSet<i64>> = changes.genre_ids.map(|ids| {
            ids.into_iter()
                .filter(|g| tables.genres.contains_key(g))
                .collect()
        });
        let Some(title) = tables.titles.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(name) = changes.name {
            title.name = name;
        }
        if let Some(year) = changes.year {
            title.year = year;
        }
        if let Some(description) = changes.description {
            title.description = description;
        }
        if let Some(category_id) = changes.category_id {
            title.category_id = Some(category_id);
        }
        if let Some(genre_ids) = genre_ids {
            title.genre_ids = genre_ids;
        }
        Ok(true)
    }

    async fn delete_title(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.titles.remove(&id).is_none() {
            return Ok(false);
        }
        let reviews: Vec<i64> = tables
            .reviews
            .values()
            .filter(|r| r.entry.parent_id == id)
            .map(|r| r.entry.id)
            .collect();
        for review_id in reviews {
            tables.remove_review(review_id);
        }
        Ok(true)
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn list_reviews(&self, title_id: i64, page: PageParams) -> Result<Page<Review>, AppError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<&ReviewRow> = tables
            .reviews
            .values()
            .filter(|r| r.entry.parent_id == title_id)
            .collect();
        rows.sort_by(|a, b| newest_first(&a.entry, &b.entry));
        let reviews = rows.into_iter().map(|r| tables.review(r)).collect();
        Ok(Page::from_sorted(reviews, page))
    }

    async fn find_review(&self, title_id: i64, review_id: i64) -> Result<Option<Review>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reviews
            .get(&review_id)
            .filter(|r| r.entry.parent_id == title_id)
            .map(|r| tables.review(r)))
    }

    async fn find_review_by_author(
        &self,
        title_id: i64,
        author_id: i64,
    ) -> Result<Option<Review>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reviews
            .values()
            .find(|r| r.entry.parent_id == title_id && r.entry.author_id == author_id)
            .map(|r| tables.review(r)))
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, AppError> {
        let mut tables = self.tables.lock().await;
        if !tables.titles.contains_key(&review.title_id) {
            return Err(AppError::title_not_found());
        }
        if tables
            .reviews
            .values()
            .any(|r| r.entry.parent_id == review.title_id && r.entry.author_id == review.author_id)
        {
            return Err(AppError::duplicate_review());
        }
        let id = tables.next_id();
        let row = ReviewRow {
            entry: EntryRow {
                id,
                parent_id: review.title_id,
                author_id: review.author_id,
                text: review.text,
                pub_date: Utc::now(),
            },
            score: review.score,
        };
        let created = tables.review(&row);
        tables.reviews.insert(id, row);
        Ok(created)
    }

    async fn update_review(
        &self,
        review_id: i64,
        text: Option<String>,
        score: Option<i16>,
    ) -> Result<Option<Review>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(row) = tables.reviews.get_mut(&review_id) else {
            return Ok(None);
        };
        if let Some(text) = text {
            row.entry.text = text;
        }
        if let Some(score) = score {
            row.score = score;
        }
        let row = row.clone();
        Ok(Some(tables.review(&row)))
    }

    async fn delete_review(&self, review_id: i64) -> Result<bool, AppError> {
        Ok(self.tables.lock().await.remove_review(review_id))
    }

    async fn list_comments(&self, review_id: i64, page: PageParams) -> Result<Page<Comment>, AppError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<&EntryRow> = tables
            .comments
            .values()
            .filter(|c| c.parent_id == review_id)
            .collect();
        rows.sort_by(|a, b| newest_first(a, b));
        let comments = rows.into_iter().map(|c| tables.comment(c)).collect();
        Ok(Page::from_sorted(comments, page))
    }

    async fn find_comment(&self, review_id: i64, comment_id: i64) -> Result<Option<Comment>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .comments
            .get(&comment_id)
            .filter(|c| c.parent_id == review_id)
            .map(|c| tables.comment(c)))
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, AppError> {
        let mut tables = self.tables.lock().await;
        if !tables.reviews.contains_key(&comment.review_id) {
            return Err(AppError::review_not_found());
        }
        let id = tables.next_id();
        let row = EntryRow {
            id,
            parent_id: comment.review_id,
            author_id: comment.author_id,
            text: comment.text,
            pub_date: Utc::now(),
        };
        let created = tables.comment(&row);
        tables.comments.insert(id, row);
        Ok(created)
    }

    async fn update_comment(&self, comment_id: i64, text: String) -> Result<Option<Comment>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(row) = tables.comments.get_mut(&comment_id) else {
            return Ok(None);
        };
        row.text = text;
        let row = row.clone();
        Ok(Some(tables.comment(&row)))
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool, AppError> {
        Ok(self.tables.lock().await.comments.remove(&comment_id).is_some())
    }
}
