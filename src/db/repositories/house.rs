use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;

use crate::domain::{HouseId, HouseStatus, UserId};
use crate::entities::{cultivation_cycles, houses, prelude::*};
use crate::models::{House, HousePatch};

/// Repository for greenhouse records
pub struct HouseRepository {
    conn: DatabaseConnection,
}

impl HouseRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, owner_id: UserId, name: &str, location: &str) -> Result<House> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = houses::ActiveModel {
            owner_id: Set(owner_id.value()),
            name: Set(name.to_string()),
            location: Set(location.to_string()),
            status: Set(HouseStatus::Idle.as_str().to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert house")?;

        info!("Created house {} for owner {}", model.id, owner_id);
        House::try_from(model)
    }

    pub async fn get(&self, id: HouseId) -> Result<Option<House>> {
        let model = Houses::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query house")?;

        model.map(House::try_from).transpose()
    }

    pub async fn list_all(&self) -> Result<Vec<House>> {
        let rows = Houses::find()
            .order_by_asc(houses::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list houses")?;

        rows.into_iter().map(House::try_from).collect()
    }

    pub async fn list_for_owner(&self, owner_id: UserId) -> Result<Vec<House>> {
        let rows = Houses::find()
            .filter(houses::Column::OwnerId.eq(owner_id.value()))
            .order_by_asc(houses::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list houses for owner")?;

        rows.into_iter().map(House::try_from).collect()
    }

    /// Apply a patch. Returns `None` if the house does not exist.
    pub async fn update(&self, id: HouseId, patch: &HousePatch) -> Result<Option<House>> {
        let Some(model) = Houses::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query house for update")?
        else {
            return Ok(None);
        };

        let mut active: houses::ActiveModel = model.into();
        if let Some(name) = &patch.name {
            active.name = Set(name.clone());
        }
        if let Some(location) = &patch.location {
            active.location = Set(location.clone());
        }
        if let Some(status) = patch.status {
            active.status = Set(status.as_str().to_string());
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update house")?;

        House::try_from(model).map(Some)
    }

    /// Delete a house together with its cycle history.
    pub async fn delete(&self, id: HouseId) -> Result<bool> {
        let txn = self.conn.begin().await?;

        CultivationCycles::delete_many()
            .filter(cultivation_cycles::Column::HouseId.eq(id.value()))
            .exec(&txn)
            .await
            .context("Failed to delete cultivation history")?;

        let result = Houses::delete_by_id(id.value())
            .exec(&txn)
            .await
            .context("Failed to delete house")?;

        txn.commit().await?;

        if result.rows_affected > 0 {
            info!("Deleted house {}", id);
        }
        Ok(result.rows_affected > 0)
    }
}
