// src/error.rs

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::config::{MAX_SCORE, MIN_SCORE};

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
///
/// `code` is a stable machine-readable identifier, `field` names the
/// offending request field where there is one.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    Validation {
        code: &'static str,
        field: Option<&'static str>,
        message: String,
    },

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound {
        code: &'static str,
        message: String,
    },

    // 409 Conflict (e.g., duplicate review, taken username)
    Conflict {
        code: &'static str,
        message: String,
    },

    // 503 Service Unavailable (mail collaborator down)
    Unavailable(String),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            code: "invalid",
            field: Some(field),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::Validation {
            code: "bad_request",
            field: None,
            message: message.into(),
        }
    }

    pub fn unauthenticated() -> Self {
        AppError::AuthError("Authentication credentials were not provided".to_string())
    }

    pub fn forbidden() -> Self {
        AppError::Forbidden("You do not have permission to perform this action".to_string())
    }

    pub fn reserved_username(username: &str) -> Self {
        AppError::Validation {
            code: "reserved_username",
            field: Some("username"),
            message: format!("Username '{}' is reserved", username),
        }
    }

    pub fn email_mismatch() -> Self {
        AppError::Validation {
            code: "email_mismatch",
            field: Some("email"),
            message: "Email does not match the one registered for this username".to_string(),
        }
    }

    pub fn invalid_confirmation_code() -> Self {
        AppError::Validation {
            code: "invalid_confirmation_code",
            field: Some("confirmation_code"),
            message: "Invalid confirmation code".to_string(),
        }
    }

    pub fn score_out_of_range(score: i64) -> Self {
        AppError::Validation {
            code: "score_out_of_range",
            field: Some("score"),
            message: format!(
                "Score {} is outside the allowed range {}..={}",
                score, MIN_SCORE, MAX_SCORE
            ),
        }
    }

    pub fn year_in_future(year: i32, current: i32) -> Self {
        AppError::Validation {
            code: "year_in_future",
            field: Some("year"),
            message: format!("Year {} is later than the current year {}", year, current),
        }
    }

    pub fn category_not_found(slug: &str) -> Self {
        AppError::Validation {
            code: "category_not_found",
            field: Some("category"),
            message: format!("Category '{}' does not exist", slug),
        }
    }

    pub fn genre_not_found(slug: &str) -> Self {
        AppError::Validation {
            code: "genre_not_found",
            field: Some("genre"),
            message: format!("Genre '{}' does not exist", slug),
        }
    }

    pub fn user_not_found() -> Self {
        AppError::NotFound {
            code: "user_not_found",
            message: "User not found".to_string(),
        }
    }

    pub fn title_not_found() -> Self {
        AppError::NotFound {
            code: "title_not_found",
            message: "Title not found".to_string(),
        }
    }

    pub fn review_not_found() -> Self {
        AppError::NotFound {
            code: "review_not_found",
            message: "Review not found".to_string(),
        }
    }

    pub fn comment_not_found() -> Self {
        AppError::NotFound {
            code: "comment_not_found",
            message: "Comment not found".to_string(),
        }
    }

    pub fn term_not_found(kind: &str) -> Self {
        AppError::NotFound {
            code: "not_found",
            message: format!("{} not found", kind),
        }
    }

    pub fn duplicate_review() -> Self {
        AppError::Conflict {
            code: "duplicate_review",
            message: "You have already reviewed this title".to_string(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Conflict {
            code,
            message: message.into(),
        }
    }

    /// Machine-readable code carried in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InternalServerError(_) => "internal",
            AppError::Validation { code, .. } => *code,
            AppError::AuthError(_) => "unauthenticated",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound { code, .. } => *code,
            AppError::Conflict { code, .. } => *code,
            AppError::Unavailable(_) => "unavailable",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, error_message, field) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                    None,
                )
            }
            AppError::Validation { field, message, .. } => {
                (StatusCode::BAD_REQUEST, message, field)
            }
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::NotFound { message, .. } => (StatusCode::NOT_FOUND, message, None),
            AppError::Conflict { message, .. } => (StatusCode::CONFLICT, message, None),
            AppError::Unavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg, None)
            }
        };
        let body = Json(json!({
            "error": error_message,
            "code": code,
            "field": field,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::bad_request(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Report the alphabetically first offending field; the message lists all of them.
        let mut names: Vec<_> = errors.field_errors().into_keys().collect();
        names.sort();
        let field = names
            .first()
            .map(|name| known_field(name).unwrap_or("non_field_errors"));
        AppError::Validation {
            code: "invalid",
            field,
            message: errors.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        rejected("body", rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        rejected("path", rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        rejected("query", rejection.body_text())
    }
}

fn rejected(part: &str, detail: String) -> AppError {
    tracing::debug!("Rejected request {}: {}", part, detail);
    AppError::Validation {
        code: "invalid",
        field: rejected_field(&detail),
        message: detail,
    }
}

/// Request fields that may be named in an error body.
fn known_field(name: &str) -> Option<&'static str> {
    Some(match name {
        "username" => "username",
        "email" => "email",
        "role" => "role",
        "name" => "name",
        "slug" => "slug",
        "year" => "year",
        "category" => "category",
        "genre" => "genre",
        "text" => "text",
        "score" => "score",
        "description" => "description",
        "confirmation_code" => "confirmation_code",
        "first_name" => "first_name",
        "last_name" => "last_name",
        "bio" => "bio",
        "limit" => "limit",
        "offset" => "offset",
        _ => return None,
    })
}

/// Pulls the field name out of a deserializer message such as
/// "...target type: score: invalid type" or "missing field `score`".
fn rejected_field(detail: &str) -> Option<&'static str> {
    if let Some((_, rest)) = detail.split_once("missing field `") {
        return rest.split('`').next().and_then(known_field);
    }
    let (_, rest) = detail
        .split_once("target type: ")
        .or_else(|| detail.split_once("query string: "))?;
    rest.split_once(": ").and_then(|(path, _)| known_field(path))
}
