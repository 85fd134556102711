//! Create user command handler

use anyhow::bail;
use std::sync::Arc;

use crate::config::{Config, CredentialBackend};
use crate::db::Store;
use crate::domain::Role;
use crate::models::NewUser;
use crate::services::{
    CredentialError, CredentialStore, PasswordHasher, SeaOrmCredentialStore, validate_new_user,
};

pub async fn cmd_create_user(
    config: &Config,
    username: &str,
    email: &str,
    password: &str,
    admin: bool,
) -> anyhow::Result<()> {
    if config.storage.credential_backend == CredentialBackend::Memory {
        bail!(
            "The credential backend is 'memory'; accounts created here would be lost. \
             Use [security.bootstrap_admin] in config.toml instead."
        );
    }

    let role = if admin { Role::Admin } else { Role::User };
    let new_user = NewUser {
        username: username.to_string(),
        password: password.to_string(),
        email: email.to_string(),
        role,
    };

    validate_new_user(&new_user, config.security.min_password_length)?;

    let store = Store::new(&config.general.database_path).await?;
    let hasher = Arc::new(PasswordHasher::new(&config.security)?);
    let credentials = SeaOrmCredentialStore::new(store, hasher);

    match credentials.create(new_user).await {
        Ok(user) => {
            println!("✓ Created {} '{}' (ID: {})", user.role, user.username, user.id);
            Ok(())
        }
        Err(CredentialError::DuplicateUsername(name)) => {
            bail!("Username '{name}' is already taken")
        }
        Err(e) => bail!("Failed to create user: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> (std::path::PathBuf, Config) {
        let path =
            std::env::temp_dir().join(format!("smartfarm-cli-{}.db", uuid::Uuid::new_v4()));
        let mut config = Config::default();
        config.general.database_path = format!("sqlite:{}", path.display());
        config.security.argon2_memory_cost_kib = 1024;
        config.security.argon2_time_cost = 1;
        (path, config)
    }

    #[tokio::test]
    async fn memory_backend_is_an_error() {
        let (path, mut config) = config();
        config.storage.credential_backend = CredentialBackend::Memory;

        let err = cmd_create_user(&config, "alice", "alice@example.com", "secret1", false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("memory"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn invalid_accounts_are_rejected_before_opening_the_database() {
        let (path, config) = config();

        for (username, email, password) in [
            ("bad name!", "alice@example.com", "secret1"),
            ("alice", "not-an-email", "secret1"),
            ("alice", "alice@example.com", "x"),
        ] {
            assert!(
                cmd_create_user(&config, username, email, password, false)
                    .await
                    .is_err(),
                "{username} / {email} / {password}"
            );
        }
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn duplicate_username_is_an_error() {
        let (path, config) = config();

        cmd_create_user(&config, "alice", "alice@example.com", "secret1", true)
            .await
            .unwrap();
        let err = cmd_create_user(&config, "alice", "other@example.com", "secret1", false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already taken"));

        let _ = std::fs::remove_file(path);
    }
}
