// src/handlers/auth.rs

use axum::{extract::State, response::IntoResponse};

use crate::{
    error::AppError,
    models::user::{SignupRequest, TokenRequest},
    services::accounts,
    state::AppState,
    utils::extract::Json,
};

/// Registers a user, or re-sends a fresh code to a pending one.
///
/// Returns 200 with the echoed username and email. The code itself only
/// travels by mail.
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = accounts::signup(&state, payload).await?;
    Ok(Json(response))
}

/// Exchanges username + confirmation code for a bearer token.
pub async fn token(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = accounts::issue_token(&state, payload).await?;
    Ok(Json(response))
}
