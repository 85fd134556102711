use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::domain::{HouseId, Role, UserId};
use crate::models::{CultivationCycle, House, HousePatch, User, UserRecord};

pub mod migrator;
pub mod repositories;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn house_repo(&self) -> repositories::house::HouseRepository {
        repositories::house::HouseRepository::new(self.conn.clone())
    }

    fn cycle_repo(&self) -> repositories::cycle::CycleRepository {
        repositories::cycle::CycleRepository::new(self.conn.clone())
    }

    // Users

    pub async fn get_user_record(&self, username: &str) -> Result<Option<UserRecord>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list().await
    }

    pub async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
        role: Role,
    ) -> Result<Option<User>> {
        self.user_repo()
            .insert(username, password_hash, email, role)
            .await
    }

    // Houses

    pub async fn insert_house(
        &self,
        owner_id: UserId,
        name: &str,
        location: &str,
    ) -> Result<House> {
        self.house_repo().insert(owner_id, name, location).await
    }

    pub async fn get_house(&self, id: HouseId) -> Result<Option<House>> {
        self.house_repo().get(id).await
    }

    pub async fn list_houses(&self) -> Result<Vec<House>> {
        self.house_repo().list_all().await
    }

    pub async fn list_houses_for_owner(&self, owner_id: UserId) -> Result<Vec<House>> {
        self.house_repo().list_for_owner(owner_id).await
    }

    pub async fn update_house(&self, id: HouseId, patch: &HousePatch) -> Result<Option<House>> {
        self.house_repo().update(id, patch).await
    }

    pub async fn delete_house(&self, id: HouseId) -> Result<bool> {
        self.house_repo().delete(id).await
    }

    // Cultivation cycles

    pub async fn get_running_cycle(&self, house_id: HouseId) -> Result<Option<CultivationCycle>> {
        self.cycle_repo().running_for_house(house_id).await
    }

    pub async fn latest_cycle(&self, house_id: HouseId) -> Result<Option<CultivationCycle>> {
        self.cycle_repo().latest_for_house(house_id).await
    }

    pub async fn list_cycles(&self, house_id: HouseId) -> Result<Vec<CultivationCycle>> {
        self.cycle_repo().list_for_house(house_id).await
    }

    pub async fn start_cycle(&self, house_id: HouseId) -> Result<Option<CultivationCycle>> {
        self.cycle_repo().start(house_id).await
    }

    pub async fn stop_cycle(&self, cycle: &CultivationCycle) -> Result<CultivationCycle> {
        self.cycle_repo().stop(cycle).await
    }
}

/// Whether a database error is a UNIQUE constraint violation.
#[must_use]
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
