use std::sync::Arc;
use tracing::info;

use crate::config::{BootstrapAdminConfig, Config, CredentialBackend};
use crate::db::Store;
use crate::domain::Role;
use crate::models::NewUser;
use crate::services::{
    AuthService, CredentialError, CredentialStore, HouseService, InMemorySensorFeed,
    MemoryCredentialStore, PasswordHasher, SeaOrmCredentialStore, SeaOrmHouseService, SensorFeed,
    SessionAuthService, TokenService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub house_service: Arc<dyn HouseService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let hasher = Arc::new(PasswordHasher::new(&config.security)?);

        let credentials: Arc<dyn CredentialStore> = match config.storage.credential_backend {
            CredentialBackend::Database => {
                Arc::new(SeaOrmCredentialStore::new(store.clone(), hasher))
            }
            CredentialBackend::Memory => {
                info!("Using in-memory credential store; accounts are lost on restart");
                Arc::new(MemoryCredentialStore::new(hasher))
            }
        };

        let tokens = Arc::new(TokenService::from_config(&config.security)?);

        let auth_service = Arc::new(SessionAuthService::new(
            credentials.clone(),
            tokens,
            &config,
        )) as Arc<dyn AuthService>;

        let sensor_feed = Arc::new(InMemorySensorFeed::new()) as Arc<dyn SensorFeed>;

        let house_service = Arc::new(SeaOrmHouseService::new(
            store.clone(),
            credentials.clone(),
            sensor_feed,
            config.operation_timeout(),
        )) as Arc<dyn HouseService>;

        if let Some(admin) = &config.security.bootstrap_admin {
            ensure_admin(credentials.as_ref(), admin).await?;
        }

        Ok(Self {
            config: Arc::new(config),
            store,
            auth_service,
            house_service,
        })
    }
}

/// Creates the configured admin account unless the username is taken.
pub async fn ensure_admin(
    credentials: &dyn CredentialStore,
    admin: &BootstrapAdminConfig,
) -> anyhow::Result<()> {
    let new_user = NewUser {
        username: admin.username.clone(),
        password: admin.password.clone(),
        email: admin.email.clone(),
        role: Role::Admin,
    };

    match credentials.create(new_user).await {
        Ok(user) => {
            info!(username = %user.username, "Bootstrap admin account created");
            Ok(())
        }
        Err(CredentialError::DuplicateUsername(_)) => Ok(()),
        Err(e) => Err(anyhow::anyhow!("Failed to create bootstrap admin: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_database() -> (std::path::PathBuf, String) {
        let path =
            std::env::temp_dir().join(format!("smartfarm-state-{}.db", uuid::Uuid::new_v4()));
        let url = format!("sqlite:{}", path.display());
        (path, url)
    }

    fn config(database_path: String) -> Config {
        let mut config = Config::default();
        config.general.database_path = database_path;
        config.security.argon2_memory_cost_kib = 1024;
        config.security.argon2_time_cost = 1;
        config.security.token_secret = Some("state-test-secret-state-test-sec".to_string());
        config.security.bootstrap_admin = Some(BootstrapAdminConfig {
            username: "root".to_string(),
            password: "root-password".to_string(),
            email: "root@example.com".to_string(),
        });
        config
    }

    #[tokio::test]
    async fn services_share_one_credential_backend() {
        let (path, url) = temp_database();
        let state = SharedState::new(config(url)).await.unwrap();

        let login = state
            .auth_service
            .login("root", "root-password")
            .await
            .unwrap();
        assert_eq!(login.user.role, Role::Admin);

        let house = state
            .house_service
            .create_house(&login.user, "North", "Field A")
            .await
            .unwrap();
        assert_eq!(house.owner_id, login.user.id);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn bootstrap_admin_is_created_once() {
        let (path, url) = temp_database();

        SharedState::new(config(url.clone())).await.unwrap();
        let state = SharedState::new(config(url)).await.unwrap();

        let admin = state
            .auth_service
            .login("root", "root-password")
            .await
            .unwrap()
            .user;
        let users = state.auth_service.list_users(&admin).await.unwrap();
        assert_eq!(users.len(), 1);

        let _ = std::fs::remove_file(path);
    }
}
