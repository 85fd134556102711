//! Domain service for authentication, sessions and authorization.
//!
//! Handles login, token resolution, logout, registration and the
//! `authorize` check every mutating registry operation runs first.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{ConflictKind, Role, UserId};
use crate::models::{NewUser, User};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("Conflict: {0}")]
    Conflict(ConflictKind),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Authenticated but not allowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct Forbidden(pub String);

impl From<Forbidden> for AuthError {
    fn from(err: Forbidden) -> Self {
        Self::Forbidden(err.0)
    }
}

/// What an actor must satisfy to perform an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Role(Role),
    /// Owner of the resource, or any admin.
    Owner(UserId),
}

/// Checks a resolved user against a requirement.
///
/// # Errors
///
/// Returns [`Forbidden`] when neither the role nor ownership matches.
pub fn authorize(user: &User, requirement: Requirement) -> Result<(), Forbidden> {
    let allowed = match requirement {
        Requirement::Role(Role::Admin) => user.role.is_admin(),
        Requirement::Role(Role::User) => true,
        Requirement::Owner(owner_id) => user.id == owner_id || user.role.is_admin(),
    };

    if allowed {
        Ok(())
    } else {
        let reason = match requirement {
            Requirement::Role(role) => format!("requires the {role} role"),
            Requirement::Owner(_) => "only the owner or an admin may do this".to_string(),
        };
        Err(Forbidden(reason))
    }
}

/// Successful login: the bearer token and who it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and issues a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown user or wrong
    /// password, with the same latency for both.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Self-service registration; always creates a `user` account.
    async fn register(&self, username: &str, password: &str, email: &str)
    -> Result<User, AuthError>;

    /// Admin-only account creation with any role.
    async fn create_user(&self, actor: &User, new_user: NewUser) -> Result<User, AuthError>;

    /// Resolves a bearer token to the current user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] for a bad, expired or revoked
    /// token, or when the account no longer exists.
    async fn resolve(&self, token: &str) -> Result<User, AuthError>;

    /// Revokes a token. Idempotent.
    async fn logout(&self, token: &str) -> Result<(), AuthError>;

    async fn list_users(&self, actor: &User) -> Result<Vec<User>, AuthError>;

    async fn get_user(&self, actor: &User, id: UserId) -> Result<User, AuthError>;
}
