//! `SeaORM` implementation of the `CredentialStore` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::db::Store;
use crate::domain::UserId;
use crate::models::{NewUser, User};
use crate::services::credential_store::{CredentialError, CredentialStore};
use crate::services::password::PasswordHasher;

pub struct SeaOrmCredentialStore {
    store: Store,
    hasher: Arc<PasswordHasher>,
}

impl SeaOrmCredentialStore {
    #[must_use]
    pub const fn new(store: Store, hasher: Arc<PasswordHasher>) -> Self {
        Self { store, hasher }
    }
}

#[async_trait]
impl CredentialStore for SeaOrmCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<User, CredentialError> {
        self.store
            .get_user_record(username)
            .await?
            .map(|record| record.user)
            .ok_or(CredentialError::NotFound)
    }

    async fn find_by_id(&self, id: UserId) -> Result<User, CredentialError> {
        self.store
            .get_user(id)
            .await?
            .ok_or(CredentialError::NotFound)
    }

    async fn list(&self) -> Result<Vec<User>, CredentialError> {
        Ok(self.store.list_users().await?)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, CredentialError> {
        let password_hash = self.hasher.hash_blocking(new_user.password).await?;

        let user = self
            .store
            .insert_user(&new_user.username, &password_hash, &new_user.email, new_user.role)
            .await?
            .ok_or(CredentialError::DuplicateUsername(new_user.username))?;

        info!(username = %user.username, role = %user.role, "Created user account");
        Ok(user)
    }

    async fn verify_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, CredentialError> {
        let record = self.store.get_user_record(username).await?;
        let stored_hash = record.as_ref().map(|r| r.password_hash.clone());

        let is_valid = self
            .hasher
            .verify_blocking(password.to_string(), stored_hash)
            .await?;

        match record {
            Some(record) if is_valid => Ok(record.user),
            _ => Err(CredentialError::InvalidCredentials),
        }
    }
}
