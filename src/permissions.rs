// src/permissions.rs

//! Authorization engine.
//!
//! Every handler resolves the caller into an [`Actor`] and asks a [`Policy`]
//! whether the request may proceed. Policies never fail on their own: they
//! answer [`Access::Allowed`] or [`Access::Denied`], and [`Access::require`]
//! turns a denial into `401` for anonymous callers or `403` for signed-in
//! ones.
//!
//! Admin privilege is `role == admin` OR the staff flag. It is decided in
//! [`Principal::is_admin`] and nowhere else.

use axum::http::Method;

use crate::{
    error::AppError,
    models::user::{Role, User},
};

/// An authenticated caller, loaded fresh from the identity store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub is_staff: bool,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin || self.is_staff
    }

    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            is_staff: user.is_staff,
        }
    }
}

/// Whoever is making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User(Principal),
}

impl Actor {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Actor::Anonymous => None,
            Actor::User(principal) => Some(principal),
        }
    }

    /// The signed-in principal, or `401`.
    pub fn require_principal(&self) -> Result<&Principal, AppError> {
        self.principal().ok_or_else(AppError::unauthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::User(_))
    }

    pub fn is_admin(&self) -> bool {
        self.principal().is_some_and(Principal::is_admin)
    }

    /// Safe methods are open to everyone, including anonymous callers.
    pub fn can_read(&self) -> bool {
        true
    }

    /// Unsafe methods on catalog-level resources (titles, categories,
    /// genres, users).
    pub fn can_write_unsafe(&self) -> bool {
        self.is_admin()
    }

    /// Unsafe methods on an authored object: its author, moderators and
    /// admins.
    pub fn can_modify(&self, object: &dyn Owned) -> bool {
        match self {
            Actor::Anonymous => false,
            Actor::User(principal) => {
                principal.id == object.author_id()
                    || principal.is_moderator()
                    || principal.is_admin()
            }
        }
    }
}

/// Anything with an author whose ownership gates modification.
pub trait Owned {
    fn author_id(&self) -> i64;
}

#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied,
}

impl Access {
    fn from_bool(allowed: bool) -> Self {
        if allowed { Access::Allowed } else { Access::Denied }
    }

    pub fn is_allowed(&self) -> bool {
        *self == Access::Allowed
    }

    /// Maps a denial to the error the caller should see.
    pub fn require(self, actor: &Actor) -> Result<(), AppError> {
        match (self, actor) {
            (Access::Allowed, _) => Ok(()),
            (Access::Denied, Actor::Anonymous) => Err(AppError::unauthenticated()),
            (Access::Denied, Actor::User(_)) => Err(AppError::forbidden()),
        }
    }
}

/// Named permission predicates, one per endpoint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Categories, genres, titles.
    ReadOnlyOrAdmin,
    /// Reviews and comments.
    AuthorModeratorAdminOrReadOnly,
    /// User management.
    AdminOnly,
    /// The caller's own profile.
    Authenticated,
}

impl Policy {
    /// Endpoint-level check, made before any object is loaded.
    pub fn has_permission(self, actor: &Actor, method: &Method) -> Access {
        let allowed = match self {
            Policy::ReadOnlyOrAdmin => {
                (method.is_safe() && actor.can_read()) || actor.can_write_unsafe()
            }
            Policy::AuthorModeratorAdminOrReadOnly => {
                (method.is_safe() && actor.can_read()) || actor.is_authenticated()
            }
            Policy::AdminOnly => actor.is_admin(),
            Policy::Authenticated => actor.is_authenticated(),
        };
        Access::from_bool(allowed)
    }

    /// Object-level check. Includes the endpoint-level check.
    pub fn has_object_permission(self, actor: &Actor, method: &Method, object: &dyn Owned) -> Access {
        if !self.has_permission(actor, method).is_allowed() {
            return Access::Denied;
        }
        let allowed = match self {
            Policy::AuthorModeratorAdminOrReadOnly => method.is_safe() || actor.can_modify(object),
            Policy::ReadOnlyOrAdmin | Policy::AdminOnly | Policy::Authenticated => true,
        };
        Access::from_bool(allowed)
    }

    pub fn authorize(self, actor: &Actor, method: &Method) -> Result<(), AppError> {
        self.has_permission(actor, method).require(actor)
    }

    pub fn authorize_object(
        self,
        actor: &Actor,
        method: &Method,
        object: &dyn Owned,
    ) -> Result<(), AppError> {
        self.has_object_permission(actor, method, object).require(actor)
    }
}
