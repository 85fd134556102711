//! In-process `CredentialStore`, used by tests and throwaway deployments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::UserId;
use crate::models::{NewUser, User, UserRecord};
use crate::services::credential_store::{CredentialError, CredentialStore};
use crate::services::password::PasswordHasher;

#[derive(Default)]
struct Users {
    by_username: HashMap<String, UserRecord>,
    next_id: i32,
}

pub struct MemoryCredentialStore {
    users: RwLock<Users>,
    hasher: Arc<PasswordHasher>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new(hasher: Arc<PasswordHasher>) -> Self {
        Self {
            users: RwLock::new(Users::default()),
            hasher,
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<User, CredentialError> {
        self.users
            .read()
            .await
            .by_username
            .get(username)
            .map(|record| record.user.clone())
            .ok_or(CredentialError::NotFound)
    }

    async fn find_by_id(&self, id: UserId) -> Result<User, CredentialError> {
        self.users
            .read()
            .await
            .by_username
            .values()
            .find(|record| record.user.id == id)
            .map(|record| record.user.clone())
            .ok_or(CredentialError::NotFound)
    }

    async fn list(&self) -> Result<Vec<User>, CredentialError> {
        let mut users: Vec<User> = self
            .users
            .read()
            .await
            .by_username
            .values()
            .map(|record| record.user.clone())
            .collect();
        users.sort_by_key(|user| user.id);
        Ok(users)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, CredentialError> {
        if self
            .users
            .read()
            .await
            .by_username
            .contains_key(&new_user.username)
        {
            return Err(CredentialError::DuplicateUsername(new_user.username));
        }

        let password_hash = self.hasher.hash_blocking(new_user.password).await?;

        // Re-checked under the write lock: another create may have won the race
        // while we were hashing.
        let mut users = self.users.write().await;
        if users.by_username.contains_key(&new_user.username) {
            return Err(CredentialError::DuplicateUsername(new_user.username));
        }

        users.next_id += 1;
        let now = chrono::Utc::now().to_rfc3339();
        let user = User {
            id: UserId::new(users.next_id),
            username: new_user.username,
            email: new_user.email,
            role: new_user.role,
            created_at: now.clone(),
            updated_at: now,
        };

        users.by_username.insert(
            user.username.clone(),
            UserRecord {
                user: user.clone(),
                password_hash,
            },
        );

        Ok(user)
    }

    async fn verify_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, CredentialError> {
        let record = self.users.read().await.by_username.get(username).cloned();
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
