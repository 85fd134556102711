//! `SeaORM` implementation of the `HouseService` trait.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::db::Store;
use crate::domain::{ConflictKind, CycleState, HouseId, HouseStatus};
use crate::models::{CultivationCycle, House, HousePatch, SensorReading, User};
use crate::services::auth_service::{Requirement, authorize};
use crate::services::credential_store::{CredentialError, CredentialStore};
use crate::services::house_locks::HouseLocks;
use crate::services::house_service::{HouseService, RegistryError};
use crate::services::sensor_feed::SensorFeed;

const MAX_NAME_LEN: usize = 100;
const MAX_LOCATION_LEN: usize = 200;

pub struct SeaOrmHouseService {
    store: Store,
    credentials: Arc<dyn CredentialStore>,
    sensors: Arc<dyn SensorFeed>,
    locks: HouseLocks,
    store_timeout: Duration,
}

impl SeaOrmHouseService {
    #[must_use]
    pub fn new(
        store: Store,
        credentials: Arc<dyn CredentialStore>,
        sensors: Arc<dyn SensorFeed>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            credentials,
            sensors,
            locks: HouseLocks::new(),
            store_timeout,
        }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, RegistryError> {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!(operation, error = ?e, "House store call failed");
                Err(RegistryError::Unavailable(format!("{operation} failed")))
            }
            Err(_) => {
                warn!(operation, timeout_ms = ?self.store_timeout, "House store call timed out");
                Err(RegistryError::Unavailable(format!("{operation} timed out")))
            }
        }
    }

    async fn fetch(&self, id: HouseId) -> Result<House, RegistryError> {
        self.bounded("get_house", self.store.get_house(id))
            .await?
            .ok_or(RegistryError::NotFound(id))
    }

    /// Loads a house the actor may act on.
    async fn fetch_owned(&self, actor: &User, id: HouseId) -> Result<House, RegistryError> {
        let house = self.fetch(id).await?;
        authorize(actor, Requirement::Owner(house.owner_id))?;
        Ok(house)
    }

    async fn running_cycle(&self, id: HouseId) -> Result<Option<CultivationCycle>, RegistryError> {
        self.bounded("get_running_cycle", self.store.get_running_cycle(id))
            .await
    }

    /// State of the house's newest cycle, `NotStarted` when it never had one.
    async fn cycle_state(
        &self,
        id: HouseId,
    ) -> Result<(CycleState, Option<CultivationCycle>), RegistryError> {
        let latest = self
            .bounded("get_latest_cycle", self.store.latest_cycle(id))
            .await?;
        let state = latest.as_ref().map_or(CycleState::NotStarted, |c| c.state);
        Ok((state, latest))
    }
}

fn validate_text(field: &str, value: &str, max_len: usize) -> Result<(), RegistryError> {
    if value.trim().is_empty() {
        return Err(RegistryError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > max_len {
        return Err(RegistryError::Validation(format!(
            "{field} must be {max_len} characters or less"
        )));
    }
    Ok(())
}

fn validate_patch(patch: &HousePatch) -> Result<(), RegistryError> {
    if patch.is_empty() {
        return Err(RegistryError::Validation(
            "Nothing to update: provide name, location or status".to_string(),
        ));
    }
    if let Some(name) = &patch.name {
        validate_text("Name", name, MAX_NAME_LEN)?;
    }
    if let Some(location) = &patch.location {
        validate_text("Location", location, MAX_LOCATION_LEN)?;
    }
    if patch.status == Some(HouseStatus::Cultivating) {
        return Err(RegistryError::Validation(
            "Status can only be set to idle or maintenance; start a cultivation cycle instead"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_reading(reading: &SensorReading) -> Result<(), RegistryError> {
    let values = [
        ("temperature", reading.temperature),
        ("humidity", reading.humidity),
        ("light", reading.light),
        ("soil_moisture", reading.soil_moisture),
    ];
    if let Some((field, _)) = values.iter().find(|(_, v)| !v.is_finite()) {
        return Err(RegistryError::Validation(format!("{field} must be a number")));
    }
    for (field, value) in [
        ("humidity", reading.humidity),
        ("soil_moisture", reading.soil_moisture),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(RegistryError::Validation(format!(
                "{field} must be between 0 and 100"
            )));
        }
    }
    if reading.light < 0.0 {
        return Err(RegistryError::Validation(
            "light must not be negative".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl HouseService for SeaOrmHouseService {
    async fn create_house(
        &self,
        owner: &User,
        name: &str,
        location: &str,
    ) -> Result<House, RegistryError> {
        match tokio::time::timeout(self.store_timeout, self.credentials.find_by_id(owner.id)).await
        {
            Ok(Ok(_)) => {}
            Ok(Err(CredentialError::NotFound)) => {
                return Err(RegistryError::OwnerNotFound(owner.id));
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                warn!(operation = "find_owner", timeout_ms = ?self.store_timeout, "Credential store call timed out");
                return Err(RegistryError::Unavailable("find_owner timed out".to_string()));
            }
        }

        validate_text("Name", name, MAX_NAME_LEN)?;
        validate_text("Location", location, MAX_LOCATION_LEN)?;

        let house = self
            .bounded(
                "insert_house",
                self.store.insert_house(owner.id, name.trim(), location.trim()),
            )
            .await?;

        info!(house_id = %house.id, owner_id = %owner.id, "House created");
        Ok(house)
    }

    async fn get_house(&self, actor: &User, id: HouseId) -> Result<House, RegistryError> {
        self.fetch_owned(actor, id).await
    }

    async fn list_houses(&self, actor: &User) -> Result<Vec<House>, RegistryError> {
        if actor.role.is_admin() {
            self.bounded("list_houses", self.store.list_houses()).await
        } else {
            self.bounded("list_houses", self.store.list_houses_for_owner(actor.id))
                .await
        }
    }

    async fn update_house(
        &self,
        actor: &User,
        id: HouseId,
        patch: HousePatch,
    ) -> Result<House, RegistryError> {
        let _guard = self.locks.acquire(id).await;

        let house = self.fetch_owned(actor, id).await?;
        validate_patch(&patch)?;

        if patch.status.is_some_and(|status| status != house.status)
            && self.running_cycle(id).await?.is_some()
        {
            return Err(RegistryError::Conflict(ConflictKind::ActiveCycle));
        }

        let updated = self
            .bounded("update_house", self.store.update_house(id, &patch))
            .await?
            .ok_or(RegistryError::NotFound(id))?;

        info!(house_id = %id, actor = %actor.username, status = %updated.status, "House updated");
        Ok(updated)
    }

    async fn delete_house(&self, actor: &User, id: HouseId) -> Result<(), RegistryError> {
        let _guard = self.locks.acquire(id).await;

        self.fetch_owned(actor, id).await?;

        if self.running_cycle(id).await?.is_some() {
            return Err(RegistryError::Conflict(ConflictKind::ActiveCycle));
        }

        let deleted = self
            .bounded("delete_house", self.store.delete_house(id))
            .await?;
        if !deleted {
            return Err(RegistryError::NotFound(id));
        }

        self.sensors.forget(id).await;

        info!(house_id = %id, actor = %actor.username, "House deleted");
        Ok(())
    }

    async fn start(
        &self,
        actor: &User,
        house_id: HouseId,
    ) -> Result<CultivationCycle, RegistryError> {
        let _guard = self.locks.acquire(house_id).await;

        let house = self.fetch_owned(actor, house_id).await?;

        if house.status == HouseStatus::Maintenance {
            return Err(RegistryError::Conflict(ConflictKind::UnderMaintenance));
        }
        let (state, _) = self.cycle_state(house_id).await?;
        if !state.can_transition_to(CycleState::Running) {
            return Err(RegistryError::Conflict(ConflictKind::AlreadyRunning));
        }

        let cycle = self
            .bounded("start_cycle", self.store.start_cycle(house_id))
            .await?
            .ok_or(RegistryError::Conflict(ConflictKind::AlreadyRunning))?;

        metrics::counter!("cultivation_transitions_total", "transition" => "start").increment(1);
        info!(house_id = %house_id, cycle_id = %cycle.id, actor = %actor.username, "Cultivation started");
        Ok(cycle)
    }

    async fn stop(
        &self,
        actor: &User,
        house_id: HouseId,
    ) -> Result<CultivationCycle, RegistryError> {
        let _guard = self.locks.acquire(house_id).await;

        self.fetch_owned(actor, house_id).await?;

        let running = match self.cycle_state(house_id).await? {
            (state, Some(cycle)) if state.can_transition_to(CycleState::Stopped) => cycle,
            _ => return Err(RegistryError::Conflict(ConflictKind::NotRunning)),
        };

        let cycle = self
            .bounded("stop_cycle", self.store.stop_cycle(&running))
            .await?;

        metrics::counter!("cultivation_transitions_total", "transition" => "stop").increment(1);
        info!(house_id = %house_id, cycle_id = %cycle.id, actor = %actor.username, "Cultivation stopped");
        Ok(cycle)
    }

    async fn cycles(
        &self,
        actor: &User,
        house_id: HouseId,
    ) -> Result<Vec<CultivationCycle>, RegistryError> {
        self.fetch_owned(actor, house_id).await?;
        self.bounded("list_cycles", self.store.list_cycles(house_id))
            .await
    }

    async fn latest_reading(
        &self,
        actor: &User,
        house_id: HouseId,
    ) -> Result<Option<SensorReading>, RegistryError> {
        self.fetch_owned(actor, house_id).await?;
        Ok(self.sensors.latest(house_id).await)
    }

    async fn record_reading(
        &self,
        actor: &User,
        reading: SensorReading,
    ) -> Result<(), RegistryError> {
        self.fetch_owned(actor, reading.house_id).await?;
        validate_reading(&reading)?;

        self.sensors.record(reading).await;
        Ok(())
    }
}
