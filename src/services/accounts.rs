// src/services/accounts.rs

use std::collections::BTreeSet;

use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        page::{Page, PageParams},
        user::{
            CreateUserRequest, NewUser, Role, SignupRequest, SignupResponse, TokenRequest,
            TokenResponse, UpdateUserRequest, User, UserChanges,
        },
    },
    permissions::Principal,
    state::AppState,
    utils::{confirmation::generate_code, mail::confirmation_message},
};

/// Usernames nobody may register or switch to.
///
/// The self-profile path segment is always reserved, since `/users/{name}`
/// would otherwise be shadowed by it.
#[derive(Debug, Clone)]
pub struct UsernamePolicy {
    reserved: BTreeSet<String>,
}

impl UsernamePolicy {
    pub fn new<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            reserved: reserved
                .into_iter()
                .map(|name| name.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new([config.profile_endpoint.as_str()])
    }

    pub fn is_reserved(&self, username: &str) -> bool {
        self.reserved.contains(&username.to_lowercase())
    }

    pub fn check(&self, username: &str) -> Result<(), AppError> {
        if self.is_reserved(username) {
            return Err(AppError::reserved_username(username));
        }
        Ok(())
    }
}

/// Registers a new account, or re-issues a code for an existing one.
///
/// Re-issuing rotates the code, so any earlier code stops working. The user
/// record survives a mail failure; the caller gets 503 and may simply retry.
pub async fn signup(state: &AppState, payload: SignupRequest) -> Result<SignupResponse, AppError> {
    payload.validate()?;
    state.usernames.check(&payload.username)?;

    let code = generate_code();

    let existing = state.users.find_user_by_username(&payload.username).await?;
    let user = match existing {
        Some(existing) => {
            if existing.email != payload.email {
                return Err(AppError::email_mismatch());
            }
            state.users.set_confirmation_code(existing.id, &code).await?;
            tracing::info!(
                username = %existing.username,
                status = ?existing.status(),
                "confirmation code re-issued"
            );
            existing
        }
        None => {
            let user = state
                .users
                .create_user(NewUser {
                    username: payload.username,
                    email: payload.email,
                    confirmation_code: Some(code.clone()),
                    ..Default::default()
                })
                .await?;
            tracing::info!(username = %user.username, "user signed up");
            user
        }
    };

    let (subject, body) = confirmation_message(&user.username, &code);
    state
        .mailer
        .send(&user.email, &subject, &body)
        .await
        .map_err(|e| {
            tracing::warn!(username = %user.username, "confirmation mail not sent: {}", e);
            AppError::Unavailable("Could not send the confirmation code, try again later".to_string())
        })?;

    Ok(SignupResponse {
        username: user.username,
        email: user.email,
    })
}

/// Exchanges a confirmation code for an access token. A code works once.
pub async fn issue_token(state: &AppState, payload: TokenRequest) -> Result<TokenResponse, AppError> {
    payload.validate()?;

    let user = state
        .users
        .find_user_by_username(&payload.username)
        .await?
        .ok_or_else(AppError::user_not_found)?;

    let user = state
        .users
        .consume_confirmation_code(user.id, &payload.confirmation_code)
        .await?
        .ok_or_else(AppError::invalid_confirmation_code)?;

    let token = state.tokens.sign(&user)?;
    tracing::info!(username = %user.username, "access token issued");

    Ok(TokenResponse { token })
}

pub async fn get_profile(state: &AppState, principal: &Principal) -> Result<User, AppError> {
    state
        .users
        .find_user_by_id(principal.id)
        .await?
        .ok_or_else(AppError::user_not_found)
}

/// Partial update of the caller's own record. `role` is ignored here.
pub async fn update_profile(
    state: &AppState,
    principal: &Principal,
    mut payload: UpdateUserRequest,
) -> Result<User, AppError> {
    payload.role = None;
    apply_update(state, principal.id, payload).await
}

pub async fn list_users(
    state: &AppState,
    search: Option<&str>,
    page: PageParams,
) -> Result<Page<User>, AppError> {
    state.users.list_users(search, page).await
}

/// Admin account creation. No confirmation code is set; the account obtains
/// one through signup with the same email.
pub async fn create_user(state: &AppState, payload: CreateUserRequest) -> Result<User, AppError> {
    payload.validate()?;
    state.usernames.check(&payload.username)?;

    let user = state
        .users
        .create_user(NewUser {
            username: payload.username,
            email: payload.email,
            role: payload.role.unwrap_or_default(),
            first_name: payload.first_name,
            last_name: payload.last_name,
            bio: payload.bio,
            ..Default::default()
        })
        .await?;

    tracing::info!(username = %user.username, role = %user.role, "user created by admin");
    Ok(user)
}

pub async fn get_user(state: &AppState, username: &str) -> Result<User, AppError> {
    state
        .users
        .find_user_by_username(username)
        .await?
        .ok_or_else(AppError::user_not_found)
}

pub async fn update_user(
    state: &AppState,
    username: &str,
    payload: UpdateUserRequest,
) -> Result<User, AppError> {
    let user = get_user(state, username).await?;
    apply_update(state, user.id, payload).await
}

/// Deletes an account with everything it authored. Admins cannot delete
/// themselves.
pub async fn delete_user(
    state: &AppState,
    principal: &Principal,
    username: &str,
) -> Result<(), AppError> {
    let user = get_user(state, username).await?;
    if user.id == principal.id {
        return Err(AppError::bad_request("Cannot delete yourself"));
    }

    if !state.users.delete_user(user.id).await? {
        return Err(AppError::user_not_found());
    }
    tracing::info!(username = %user.username, by = %principal.username, "user deleted");
    Ok(())
}

/// Creates the configured admin account if it does not exist yet.
pub async fn seed_admin(state: &AppState) -> Result<(), AppError> {
    let (Some(username), Some(email)) = (&state.config.admin_username, &state.config.admin_email)
    else {
        return Ok(());
    };

    if state.users.find_user_by_username(username).await?.is_some() {
        return Ok(());
    }

    tracing::info!("Seeding admin user: {}", username);
    state
        .users
        .create_user(NewUser {
            username: username.clone(),
            email: email.clone(),
            role: Role::Admin,
            is_staff: true,
            ..Default::default()
        })
        .await?;
    tracing::info!("Admin user created successfully.");
    Ok(())
}

async fn apply_update(
    state: &AppState,
    id: i64,
    payload: UpdateUserRequest,
) -> Result<User, AppError> {
    payload.validate()?;
    if let Some(username) = &payload.username {
        state.usernames.check(username)?;
    }

    state
        .users
        .update_user(
            id,
            UserChanges {
                username: payload.username,
                email: payload.email,
                role: payload.role,
                first_name: payload.first_name,
                last_name: payload.last_name,
                bio: payload.bio,
            },
        )
        .await?
        .ok_or_else(AppError::user_not_found)
}
