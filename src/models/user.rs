// src/models/user.rs

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::{
    EMAIL_MAX_LENGTH, PERSON_NAME_MAX_LENGTH, USERNAME_MAX_LENGTH,
};

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.@+-]+\z").unwrap_or_else(|e| panic!("invalid username pattern: {e}"))
});

/// User role: 'user', 'moderator' or 'admin'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Where a user stands in the signup flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    PendingConfirmation,
    Confirmed,
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    pub email: String,

    pub role: Role,

    /// Staff accounts carry admin privileges regardless of `role`.
    #[serde(skip)]
    pub is_staff: bool,

    /// Pending one-time code. Skipped during serialization.
    #[serde(skip)]
    pub confirmation_code: Option<String>,

    #[serde(skip)]
    pub is_confirmed: bool,

    pub first_name: String,
    pub last_name: String,
    pub bio: String,

    #[serde(skip)]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn status(&self) -> AccountStatus {
        if self.is_confirmed {
            AccountStatus::Confirmed
        } else {
            AccountStatus::PendingConfirmation
        }
    }
}

/// Insert payload for the identity store.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_staff: bool,
    pub confirmation_code: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
}

/// Partial update for the identity store; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

/// DTO for `POST /auth/signup`.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(
        length(min = 1, max = USERNAME_MAX_LENGTH, message = "Username must be 1-150 characters."),
        custom(function = validate_username_chars)
    )]
    pub username: String,
    #[validate(email, length(max = EMAIL_MAX_LENGTH))]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub username: String,
    pub email: String,
}

/// DTO for `POST /auth/token`.
#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(
        length(min = 1, max = USERNAME_MAX_LENGTH),
        custom(function = validate_username_chars)
    )]
    pub username: String,
    #[validate(length(min = 1))]
    pub confirmation_code: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// DTO for an admin creating a user (can specify role).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        length(min = 1, max = USERNAME_MAX_LENGTH),
        custom(function = validate_username_chars)
    )]
    pub username: String,
    #[validate(email, length(max = EMAIL_MAX_LENGTH))]
    pub email: String,
    pub role: Option<Role>,
    #[validate(length(max = PERSON_NAME_MAX_LENGTH))]
    #[serde(default)]
    pub first_name: String,
    #[validate(length(max = PERSON_NAME_MAX_LENGTH))]
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub bio: String,
}

/// DTO for updating a user. Fields are optional.
///
/// The self-profile endpoint drops `role` before it reaches the store.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 1, max = USERNAME_MAX_LENGTH),
        custom(function = validate_username_chars)
    )]
    pub username: Option<String>,
    #[validate(email, length(max = EMAIL_MAX_LENGTH))]
    pub email: Option<String>,
    pub role: Option<Role>,
    #[validate(length(max = PERSON_NAME_MAX_LENGTH))]
    pub first_name: Option<String>,
    #[validate(length(max = PERSON_NAME_MAX_LENGTH))]
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

/// Query parameters for the admin user list.
#[derive(Debug, Deserialize)]
pub struct UserListParams {
    /// Exact username match.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Letters, digits and `.@+-_` only.
pub fn validate_username_chars(username: &str) -> Result<(), validator::ValidationError> {
    if !USERNAME_RE.is_match(username) {
        return Err(validator::ValidationError::new("invalid_username")
            .with_message("Username may contain only letters, digits and @/./+/-/_".into()));
    }
    Ok(())
}
