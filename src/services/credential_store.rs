//! Credential store contract: user identities, password hashes and roles.
//!
//! Implementations own the user table. Nothing outside them ever sees a
//! password hash.

use thiserror::Error;

use crate::domain::UserId;
use crate::models::{NewUser, User};

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("User not found")]
    NotFound,

    #[error("Username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Credential store unavailable: {0}")]
    Unavailable(String),
}

impl From<anyhow::Error> for CredentialError {
    fn from(err: anyhow::Error) -> Self {
        Self::Unavailable(format!("{err:#}"))
    }
}

#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Case-sensitive lookup.
    async fn find_by_username(&self, username: &str) -> Result<User, CredentialError>;

    async fn find_by_id(&self, id: UserId) -> Result<User, CredentialError>;

    async fn list(&self) -> Result<Vec<User>, CredentialError>;

    /// Hashes the password and stores the account.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::DuplicateUsername`] if the username exists.
    async fn create(&self, new_user: NewUser) -> Result<User, CredentialError>;

    /// Checks a password. Unknown usernames cost the same as wrong passwords
    /// and both yield [`CredentialError::InvalidCredentials`].
    async fn verify_password(&self, username: &str, password: &str)
    -> Result<User, CredentialError>;
}
