// src/config.rs

use std::{env, fmt, path::PathBuf, str::FromStr};

use dotenvy::dotenv;

/// Lowest score a review may carry.
pub const MIN_SCORE: i64 = 1;
/// Highest score a review may carry.
pub const MAX_SCORE: i64 = 10;

pub const USERNAME_MAX_LENGTH: u64 = 150;
pub const EMAIL_MAX_LENGTH: u64 = 254;
pub const NAME_MAX_LENGTH: u64 = 256;
pub const SLUG_MAX_LENGTH: u64 = 50;
pub const PERSON_NAME_MAX_LENGTH: u64 = 150;

/// Length of the alphanumeric confirmation code mailed at signup.
pub const CONFIRMATION_CODE_LENGTH: u64 = 16;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Rate limit applied to the `/auth` routes.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub per_second: u64,
    pub burst_size: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. The in-memory store is used when unset.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    /// Path segment of the self-profile endpoint (`/users/{profile_endpoint}`).
    /// Doubles as a reserved username.
    pub profile_endpoint: String,
    pub mail_from: String,
    /// Outgoing mail is written here as files when set, otherwise logged.
    pub mail_dir: Option<PathBuf>,
    pub admin_username: Option<String>,
    pub admin_email: Option<String>,
    pub auth_rate_limit: Option<RateLimit>,
}

/// A configuration variable that is missing or cannot be parsed.
#[derive(Debug)]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.var, self.reason)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError {
                var: "JWT_SECRET",
                reason: "must not be empty".to_string(),
            });
        }

        let auth_rate_limit = match (
            parsed::<u64>("AUTH_RATE_PER_SECOND")?,
            parsed::<u32>("AUTH_RATE_BURST")?,
        ) {
            (Some(per_second), burst) => Some(RateLimit {
                per_second,
                burst_size: burst.unwrap_or(5),
            }),
            (None, _) => None,
        };

        Ok(Self {
            database_url: optional("DATABASE_URL"),
            jwt_secret,
            jwt_expiration: parsed("JWT_EXPIRATION")?.unwrap_or(86_400),
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            port: parsed("PORT")?.unwrap_or(3000),
            profile_endpoint: optional("PROFILE_ENDPOINT").unwrap_or_else(|| "me".to_string()),
            mail_from: optional("MAIL_FROM").unwrap_or_else(|| "noreply@yamdb.local".to_string()),
            mail_dir: optional("MAIL_DIR").map(PathBuf::from),
            admin_username: optional("ADMIN_USERNAME"),
            admin_email: optional("ADMIN_EMAIL"),
            auth_rate_limit,
        })
    }

    /// Configuration for tests and local tooling: in-memory store, log mailer,
    /// no rate limiting.
    pub fn for_testing(jwt_secret: &str) -> Self {
        Self {
            database_url: None,
            jwt_secret: jwt_secret.to_string(),
            jwt_expiration: 600,
            rust_log: "error".to_string(),
            port: 0,
            profile_endpoint: "me".to_string(),
            mail_from: "noreply@yamdb.local".to_string(),
            mail_dir: None,
            admin_username: None,
            admin_email: None,
            auth_rate_limit: None,
        }
    }
}

fn optional(var: &'static str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.is_empty())
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError {
        var,
        reason: "must be set".to_string(),
    })
}

fn parsed<T>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    optional(var)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError {
                var,
                reason: format!("invalid value '{}': {}", raw, e),
            })
        })
        .transpose()
}
