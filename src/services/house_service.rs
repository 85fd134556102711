//! Domain service for greenhouses and their cultivation cycles.

use thiserror::Error;

use crate::domain::{ConflictKind, HouseId, UserId};
use crate::models::{CultivationCycle, House, HousePatch, SensorReading, User};
use crate::services::auth_service::Forbidden;
use crate::services::credential_store::CredentialError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("House {0} not found")]
    NotFound(HouseId),

    #[error("User {0} not found")]
    OwnerNotFound(UserId),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(ConflictKind),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl From<Forbidden> for RegistryError {
    fn from(err: Forbidden) -> Self {
        Self::Forbidden(err.0)
    }
}

impl From<anyhow::Error> for RegistryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Unavailable(format!("{err:#}"))
    }
}

impl From<CredentialError> for RegistryError {
    fn from(err: CredentialError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Every operation takes the resolved caller as `actor`. Mutations check
/// ownership before looking at the payload.
#[async_trait::async_trait]
pub trait HouseService: Send + Sync {
    /// Registers a house owned by `owner`. New houses start idle.
    async fn create_house(
        &self,
        owner: &User,
        name: &str,
        location: &str,
    ) -> Result<House, RegistryError>;

    async fn get_house(&self, actor: &User, id: HouseId) -> Result<House, RegistryError>;

    /// Admins see every house, everyone else only their own.
    async fn list_houses(&self, actor: &User) -> Result<Vec<House>, RegistryError>;

    /// # Errors
    ///
    /// `Forbidden` unless the actor owns the house or is an admin.
    /// `Conflict(ActiveCycle)` when the status is changed mid-cycle.
    async fn update_house(
        &self,
        actor: &User,
        id: HouseId,
        patch: HousePatch,
    ) -> Result<House, RegistryError>;

    /// Removes the house and its cycle history.
    async fn delete_house(&self, actor: &User, id: HouseId) -> Result<(), RegistryError>;

    /// Starts a new cultivation cycle.
    ///
    /// # Errors
    ///
    /// `Conflict(AlreadyRunning)` if a cycle is running,
    /// `Conflict(UnderMaintenance)` if the house is in maintenance.
    async fn start(&self, actor: &User, house_id: HouseId)
    -> Result<CultivationCycle, RegistryError>;

    /// Stops the running cycle; `Conflict(NotRunning)` if there is none.
    async fn stop(&self, actor: &User, house_id: HouseId)
    -> Result<CultivationCycle, RegistryError>;

    /// Cycle history, newest first.
    async fn cycles(
        &self,
        actor: &User,
        house_id: HouseId,
    ) -> Result<Vec<CultivationCycle>, RegistryError>;

    async fn latest_reading(
        &self,
        actor: &User,
        house_id: HouseId,
    ) -> Result<Option<SensorReading>, RegistryError>;

    async fn record_reading(
        &self,
        actor: &User,
        reading: SensorReading,
    ) -> Result<(), RegistryError>;
}
