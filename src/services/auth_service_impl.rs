//! Token-backed implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::domain::{ConflictKind, Role, UserId};
use crate::models::{NewUser, User};
use crate::services::auth_service::{
    AuthError, AuthService, LoginResult, Requirement, authorize,
};
use crate::services::credential_store::{CredentialError, CredentialStore};
use crate::services::token_service::TokenService;

const MAX_USERNAME_LEN: usize = 50;

pub struct SessionAuthService {
    credentials: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
    token_ttl: chrono::Duration,
    min_password_length: usize,
    store_timeout: Duration,
}

impl SessionAuthService {
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        tokens: Arc<TokenService>,
        config: &Config,
    ) -> Self {
        Self {
            credentials,
            tokens,
            token_ttl: config.access_token_ttl(),
            min_password_length: config.security.min_password_length,
            store_timeout: config.operation_timeout(),
        }
    }

    /// Runs a credential-store call under the configured deadline.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, CredentialError>>,
    ) -> Result<T, CredentialError> {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(Err(CredentialError::Unavailable(msg))) => {
                error!(operation, error = %msg, "Credential store call failed");
                Err(CredentialError::Unavailable(msg))
            }
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout_ms = ?self.store_timeout, "Credential store call timed out");
                Err(CredentialError::Unavailable(format!(
                    "{operation} timed out"
                )))
            }
        }
    }

    async fn create_account(&self, new_user: NewUser) -> Result<User, AuthError> {
        validate_new_user(&new_user, self.min_password_length)?;

        self.bounded("create_user", self.credentials.create(new_user))
            .await
            .map_err(|e| match e {
                CredentialError::DuplicateUsername(_) => {
                    AuthError::Conflict(ConflictKind::DuplicateUsername)
                }
                CredentialError::Unavailable(msg) => AuthError::Unavailable(msg),
                other => AuthError::Unavailable(other.to_string()),
            })
    }
}

/// Account rules shared by registration, admin creation and the CLI.
pub fn validate_new_user(new_user: &NewUser, min_password_length: usize) -> Result<(), AuthError> {
    let username = new_user.username.as_str();
    if username.is_empty() {
        return Err(AuthError::Validation("Username is required".to_string()));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(AuthError::Validation(format!(
            "Username must be {MAX_USERNAME_LEN} characters or less"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(AuthError::Validation(
            "Username can only contain letters, numbers, '.', '_' and '-'".to_string(),
        ));
    }

    if !new_user.email.contains('@') {
        return Err(AuthError::Validation("Email address is invalid".to_string()));
    }

    if new_user.password.chars().count() < min_password_length {
        return Err(AuthError::Validation(format!(
            "Password must be at least {} characters",
            min_password_length
        )));
    }

    Ok(())
}

#[async_trait]
impl AuthService for SessionAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let verified = self
            .bounded(
                "verify_password",
                self.credentials.verify_password(username, password),
            )
            .await;

        let user = match verified {
            Ok(user) => user,
            Err(CredentialError::Unavailable(msg)) => {
                metrics::counter!("auth_login_total", "outcome" => "unavailable").increment(1);
                return Err(AuthError::Unavailable(msg));
            }
            Err(_) => {
                metrics::counter!("auth_login_total", "outcome" => "rejected").increment(1);
                info!(username, "Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let issued = self
            .tokens
            .issue(&user.username, self.token_ttl)
            .map_err(|e| AuthError::Unavailable(format!("{e:#}")))?;

        metrics::counter!("auth_login_total", "outcome" => "success").increment(1);
        info!(username = %user.username, token_id = %issued.token_id, "Login succeeded");

        Ok(LoginResult {
            access_token: issued.token,
            expires_at: issued.expires_at,
            user,
        })
    }

    async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<User, AuthError> {
        self.create_account(NewUser {
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
            role: Role::User,
        })
        .await
    }

    async fn create_user(&self, actor: &User, new_user: NewUser) -> Result<User, AuthError> {
        authorize(actor, Requirement::Role(Role::Admin))?;
        self.create_account(new_user).await
    }

    async fn resolve(&self, token: &str) -> Result<User, AuthError> {
        let verified = self
            .tokens
            .verify(token)
            .map_err(|rejection| AuthError::Unauthenticated(rejection.to_string()))?;

        self.bounded(
            "find_by_username",
            self.credentials.find_by_username(&verified.subject),
        )
        .await
        .map_err(|e| match e {
            CredentialError::Unavailable(msg) => AuthError::Unavailable(msg),
            _ => AuthError::Unauthenticated("account no longer exists".to_string()),
        })
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.tokens.revoke(token);
        Ok(())
    }

    async fn list_users(&self, actor: &User) -> Result<Vec<User>, AuthError> {
        authorize(actor, Requirement::Role(Role::Admin))?;

        self.bounded("list_users", self.credentials.list())
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))
    }

    async fn get_user(&self, actor: &User, id: UserId) -> Result<User, AuthError> {
        if actor.id != id {
            authorize(actor, Requirement::Role(Role::Admin))?;
        }

        self.bounded("find_by_id", self.credentials.find_by_id(id))
            .await
            .map_err(|e| match e {
                CredentialError::NotFound => AuthError::UserNotFound(id),
                other => AuthError::Unavailable(other.to_string()),
            })
    }
}
