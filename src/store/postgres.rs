//! PostgreSQL store.
//!
//! Uniqueness and cascades are enforced by the schema in `migrations/`; this
//! module only maps constraint violations back to API errors.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

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

const USER_COLUMNS: &str = "id, username, email, role, is_staff, confirmation_code, is_confirmed, \
                            first_name, last_name, bio, created_at";

const REVIEW_SELECT: &str = "SELECT r.id, r.title_id, r.author_id, u.username AS author, r.text, \
                             r.score, r.pub_date FROM reviews r JOIN users u ON u.id = r.author_id";

const COMMENT_SELECT: &str = "SELECT c.id, c.review_id, c.author_id, u.username AS author, c.text, \
                              c.pub_date FROM comments c JOIN users u ON u.id = c.author_id";

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    role: String,
    is_staff: bool,
    confirmation_code: Option<String>,
    is_confirmed: bool,
    first_name: String,
    last_name: String,
    bio: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            role: row.role.parse().map_err(AppError::InternalServerError)?,
            username: row.username,
            email: row.email,
            is_staff: row.is_staff,
            confirmation_code: row.confirmation_code,
            is_confirmed: row.is_confirmed,
            first_name: row.first_name,
            last_name: row.last_name,
            bio: row.bio,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct TermRow {
    id: i64,
    name: String,
    slug: String,
}

impl From<TermRow> for Term {
    fn from(row: TermRow) -> Self {
        Term {
            id: row.id,
            name: row.name,
            slug: row.slug,
        }
    }
}

#[derive(FromRow)]
struct TitleRow {
    id: i64,
    name: String,
    year: i32,
    description: String,
    category_id: Option<i64>,
    category_name: Option<String>,
    category_slug: Option<String>,
    score_sum: i64,
    review_count: i64,
}

#[derive(FromRow)]
struct TitleGenreRow {
    title_id: i64,
    id: i64,
    name: String,
    slug: String,
}

#[derive(FromRow)]
struct ReviewRow {
    id: i64,
    title_id: i64,
    author_id: i64,
    author: String,
    text: String,
    score: i16,
    pub_date: chrono::DateTime<chrono::Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.id,
            title_id: row.title_id,
            body: Authored {
                author_id: row.author_id,
                author: row.author,
                text: row.text,
                pub_date: row.pub_date,
            },
            score: row.score,
        }
    }
}

#[derive(FromRow)]
struct CommentRow {
    id: i64,
    review_id: i64,
    author_id: i64,
    author: String,
    text: String,
    pub_date: chrono::DateTime<chrono::Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            review_id: row.review_id,
            body: Authored {
                author_id: row.author_id,
                author: row.author,
                text: row.text,
                pub_date: row.pub_date,
            },
        }
    }
}

/// Maps constraint violations to conflicts; anything else is logged and
/// becomes a 500.
fn map_db_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return unique_violation(db.constraint(), db.message());
        }
        if db.is_foreign_key_violation() {
            return foreign_key_violation(db.constraint(), db.message());
        }
    }
    tracing::error!("Database error: {:?}", err);
    AppError::from(err)
}

fn unique_violation(constraint: Option<&str>, message: &str) -> AppError {
    match constraint {
        Some("users_username_key") => AppError::conflict("username_taken", "Username is already taken"),
        Some("users_email_key") => AppError::conflict("email_taken", "Email is already registered"),
        Some("reviews_author_title_key") => AppError::duplicate_review(),
        Some("categories_slug_key") | Some("genres_slug_key") => {
            AppError::conflict("slug_taken", "Slug is already taken")
        }
        _ => AppError::conflict("conflict", message.to_string()),
    }
}

fn foreign_key_violation(constraint: Option<&str>, message: &str) -> AppError {
    match constraint {
        Some("reviews_title_id_fkey") => AppError::title_not_found(),
        Some("comments_review_id_fkey") => AppError::review_not_found(),
        Some("titles_category_id_fkey") => {
            AppError::validation("category", "Category no longer exists")
        }
        _ => AppError::bad_request(message.to_string()),
    }
}

/// Escapes LIKE wildcards and wraps the needle in `%`.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_title_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &TitleFilter) {
    builder.push(" WHERE TRUE");
    if let Some(category) = &filter.category {
        builder
            .push(" AND c.slug ILIKE ")
            .push_bind(like_pattern(category));
    }
    if let Some(genre) = &filter.genre {
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM title_genres tg JOIN genres g ON g.id = tg.genre_id \
                 WHERE tg.title_id = t.id AND g.slug ILIKE ",
            )
            .push_bind(like_pattern(genre))
            .push(")");
    }
    if let Some(name) = &filter.name {
        builder.push(" AND t.name LIKE ").push_bind(like_pattern(name));
    }
    if let Some(year) = filter.year {
        builder.push(" AND t.year = ").push_bind(year);
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attaches genres to a page of titles with one query.
    async fn hydrate_titles(&self, rows: Vec<TitleRow>) -> Result<Vec<TitleRecord>, AppError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let links = sqlx::query_as::<_, TitleGenreRow>(
            r#"
            SELECT tg.title_id, g.id, g.name, g.slug
            FROM title_genres tg
            JOIN genres g ON g.id = tg.genre_id
            WHERE tg.title_id = ANY($1)
            ORDER BY g.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let genres = links
                    .iter()
                    .filter(|l| l.title_id == row.id)
                    .map(|l| Term {
                        id: l.id,
                        name: l.name.clone(),
                        slug: l.slug.clone(),
                    })
                    .collect();
                let category = match (row.category_id, row.category_name, row.category_slug) {
                    (Some(id), Some(name), Some(slug)) => Some(Term { id, name, slug }),
                    _ => None,
                };
                TitleRecord {
                    id: row.id,
                    name: row.name,
                    year: row.year,
                    description: row.description,
                    category,
                    genres,
                    score_sum: row.score_sum,
                    review_count: row.review_count,
                }
            })
            .collect())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .map(User::try_from)
        .transpose()
    }

    async fn list_users(&self, search: Option<&str>, page: PageParams) -> Result<Page<User>, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE ($1::TEXT IS NULL OR username = $1)")
                .bind(search)
                .fetch_one(&self.pool)
                .await
                .map_err(map_db_error)?;

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE ($1::TEXT IS NULL OR username = $1) \
             ORDER BY username LIMIT $2 OFFSET $3"
        ))
        .bind(search)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Page {
            count,
            results: rows
                .into_iter()
                .map(User::try_from)
                .collect::<Result<_, _>>()?,
        })
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (username, email, role, is_staff, confirmation_code, \
             first_name, last_name, bio) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.is_staff)
        .bind(&user.confirmation_code)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.bio)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?
        .try_into()
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET \
             username = COALESCE($2, username), \
             email = COALESCE($3, email), \
             role = COALESCE($4, role), \
             first_name = COALESCE($5, first_name), \
             last_name = COALESCE($6, last_name), \
             bio = COALESCE($7, bio) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.role.map(|r| r.as_str()))
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.bio)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .map(User::try_from)
        .transpose()
    }

    async fn delete_user(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_confirmation_code(&self, id: i64, code: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET confirmation_code = $2 WHERE id = $1")
            .bind(id)
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        if result.rows_affected() == 0 {
            return Err(AppError::user_not_found());
        }
        Ok(())
    }

    async fn consume_confirmation_code(&self, id: i64, code: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET confirmation_code = NULL, is_confirmed = TRUE \
             WHERE id = $1 AND confirmation_code = $2 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .map(User::try_from)
        .transpose()
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_terms(
        &self,
        kind: TermKind,
        search: Option<&str>,
        page: PageParams,
    ) -> Result<Page<Term>, AppError> {
        let table = kind.table();
        let pattern = search.map(like_pattern);

        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {table} WHERE ($1::TEXT IS NULL OR name ILIKE $1)"
        ))
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        let rows = sqlx::query_as::<_, TermRow>(&format!(
            "SELECT id, name, slug FROM {table} \
             WHERE ($1::TEXT IS NULL OR name ILIKE $1) \
             ORDER BY name, id LIMIT $2 OFFSET $3"
        ))
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Page {
            count,
            results: rows.into_iter().map(Term::from).collect(),
        })
    }

    async fn find_terms(&self, kind: TermKind, slugs: &[String]) -> Result<Vec<Term>, AppError> {
        let rows = sqlx::query_as::<_, TermRow>(&format!(
            "SELECT id, name, slug FROM {} WHERE slug = ANY($1)",
            kind.table()
        ))
        .bind(slugs)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(rows.into_iter().map(Term::from).collect())
    }

    async fn create_term(&self, kind: TermKind, name: &str, slug: &str) -> Result<Term, AppError> {
        let row = sqlx::query_as::<_, TermRow>(&format!(
            "INSERT INTO {} (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
            kind.table()
        ))
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(row.into())
    }

    async fn delete_term(&self, kind: TermKind, slug: &str) -> Result<bool, AppError> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE slug = $1", kind.table()))
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_titles(&self, filter: &TitleFilter) -> Result<Page<TitleRecord>, AppError> {
        let page = filter.page();

        let mut count_query: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM titles t LEFT JOIN categories c ON c.id = t.category_id",
        );
        push_title_filters(&mut count_query, filter);
        let count: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT t.id, t.name, t.year, t.description,
                   c.id AS category_id, c.name AS category_name, c.slug AS category_slug,
                   COALESCE((SELECT SUM(r.score) FROM reviews r WHERE r.title_id = t.id), 0)::BIGINT AS score_sum,
                   (SELECT COUNT(*) FROM reviews r WHERE r.title_id = t.id) AS review_count
            FROM titles t
            LEFT JOIN categories c ON c.id = t.category_id
            "#,
        );
        push_title_filters(&mut query, filter);
        query
            .push(" ORDER BY t.year DESC, t.name ASC, t.id ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = query
            .build_query_as::<TitleRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(Page {
            count,
            results: self.hydrate_titles(rows).await?,
        })
    }

    async fn find_title(&self, id: i64) -> Result<Option<TitleRecord>, AppError> {
        let row = sqlx::query_as::<_, TitleRow>(
            r#"
            SELECT t.id, t.name, t.year, t.description,
                   c.id AS category_id, c.name AS category_name, c.slug AS category_slug,
                   COALESCE((SELECT SUM(r.score) FROM reviews r WHERE r.title_id = t.id), 0)::BIGINT AS score_sum,
                   (SELECT COUNT(*) FROM reviews r WHERE r.title_id = t.id) AS review_count
            FROM titles t
            LEFT JOIN categories c ON c.id = t.category_id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        match row {
            Some(row) => Ok(self.hydrate_titles(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create_title(&self, title: NewTitle) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO titles (name, year, description, category_id) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&title.name)
        .bind(title.year)
        .bind(&title.description)
        .bind(title.category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        sqlx::query(
            "INSERT INTO title_genres (title_id, genre_id) \
             SELECT $1::BIGINT, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(&title.genre_ids)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        Ok(id)
    }

    async fn update_title(&self, id: i64, changes: TitleChanges) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let result = sqlx::query(
            "UPDATE titles SET \
             name = COALESCE($2, name), \
             year = COALESCE($3, year), \
             description = COALESCE($4, description), \
             category_id = COALESCE($5, category_id) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.year)
        .bind(changes.description)
        .bind(changes.category_id)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        if let Some(genre_ids) = changes.genre_ids {
            sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(map_db_error)?;
            sqlx::query(
                "INSERT INTO title_genres (title_id, genre_id) \
                 SELECT $1::BIGINT, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(&genre_ids)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(true)
    }

    async fn delete_title(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn list_reviews(&self, title_id: i64, page: PageParams) -> Result<Page<Review>, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE title_id = $1")
            .bind(title_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "{REVIEW_SELECT} WHERE r.title_id = $1 \
             ORDER BY r.pub_date DESC, r.id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(title_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Page {
            count,
            results: rows.into_iter().map(Review::from).collect(),
        })
    }

    async fn find_review(&self, title_id: i64, review_id: i64) -> Result<Option<Review>, AppError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "{REVIEW_SELECT} WHERE r.id = $1 AND r.title_id = $2"
        ))
        .bind(review_id)
        .bind(title_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(row.map(Review::from))
    }

    async fn find_review_by_author(
        &self,
        title_id: i64,
        author_id: i64,
    ) -> Result<Option<Review>, AppError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "{REVIEW_SELECT} WHERE r.title_id = $1 AND r.author_id = $2"
        ))
        .bind(title_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(row.map(Review::from))
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, AppError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            WITH inserted AS (
                INSERT INTO reviews (title_id, author_id, text, score)
                VALUES ($1, $2, $3, $4)
                RETURNING id, title_id, author_id, text, score, pub_date
            )
            SELECT i.id, i.title_id, i.author_id, u.username AS author, i.text, i.score, i.pub_date
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(review.title_id)
        .bind(review.author_id)
        .bind(&review.text)
        .bind(review.score)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(row.into())
    }

    async fn update_review(
        &self,
        review_id: i64,
        text: Option<String>,
        score: Option<i16>,
    ) -> Result<Option<Review>, AppError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            WITH updated AS (
                UPDATE reviews
                SET text = COALESCE($2, text), score = COALESCE($3, score)
                WHERE id = $1
                RETURNING id, title_id, author_id, text, score, pub_date
            )
            SELECT d.id, d.title_id, d.author_id, u.username AS author, d.text, d.score, d.pub_date
            FROM updated d
            JOIN users u ON u.id = d.author_id
            "#,
        )
        .bind(review_id)
        .bind(text)
        .bind(score)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(row.map(Review::from))
    }

    async fn delete_review(&self, review_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self, review_id: i64, page: PageParams) -> Result<Page<Comment>, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE review_id = $1")
            .bind(review_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT} WHERE c.review_id = $1 \
             ORDER BY c.pub_date DESC, c.id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(review_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(Page {
            count,
            results: rows.into_iter().map(Comment::from).collect(),
        })
    }

    async fn find_comment(&self, review_id: i64, comment_id: i64) -> Result<Option<Comment>, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "{COMMENT_SELECT} WHERE c.id = $1 AND c.review_id = $2"
        ))
        .bind(comment_id)
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(row.map(Comment::from))
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (review_id, author_id, text)
                VALUES ($1, $2, $3)
                RETURNING id, review_id, author_id, text, pub_date
            )
            SELECT i.id, i.review_id, i.author_id, u.username AS author, i.text, i.pub_date
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(comment.review_id)
        .bind(comment.author_id)
        .bind(&comment.text)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(row.into())
    }

    async fn update_comment(&self, comment_id: i64, text: String) -> Result<Option<Comment>, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            WITH updated AS (
                UPDATE comments SET text = $2 WHERE id = $1
                RETURNING id, review_id, author_id, text, pub_date
            )
            SELECT d.id, d.review_id, d.author_id, u.username AS author, d.text, d.pub_date
            FROM updated d
            JOIN users u ON u.id = d.author_id
            "#,
        )
        .bind(comment_id)
        .bind(text)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(row.map(Comment::from))
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(result.rows_affected() > 0)
    }
}
