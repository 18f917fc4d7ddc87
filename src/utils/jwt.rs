// src/utils/jwt.rs

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::user::User,
    permissions::{Actor, Principal},
    state::AppState,
};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    pub username: String,
    /// User's role at the time of issue. Requests re-read the role from the
    /// store, so this is informational.
    pub role: String,
    /// Unique token id; every issued token differs.
    pub jti: String,
    /// Issued-at time as Unix timestamp.
    pub iat: usize,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Signs and verifies HS256 access tokens.
#[derive(Clone)]
pub struct JwtSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiration_seconds: u64,
}

impl JwtSigner {
    pub fn new(secret: &str, expiration_seconds: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiration_seconds,
        }
    }

    /// Signs a new JWT for the user.
    pub fn sign(&self, user: &User) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp().max(0) as usize;

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.as_str().to_owned(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.expiration_seconds as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(e.to_string()))
    }

    /// Verifies and decodes a JWT string.
    ///
    /// Returns the `Claims` if valid, otherwise returns an `AppError`.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

        Ok(token_data.claims)
    }
}

/// Resolves the caller from the `Authorization: Bearer <token>` header.
///
/// No header means an anonymous caller. A malformed or expired token, or a
/// token for a user that no longer exists, is rejected with 401 rather than
/// silently downgraded.
impl FromRequestParts<AppState> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(Actor::Anonymous);
        };

        let token = auth_header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::AuthError("Invalid authorization header".to_string()))?;

        let claims = state.tokens.verify(token.trim())?;
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

        let user = state
            .users
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::AuthError("User not found".to_string()))?;

        Ok(Actor::User(Principal::from(&user)))
    }
}
