use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::domain::{CycleState, HouseId, HouseStatus};
use crate::entities::{cultivation_cycles, houses, prelude::*};
use crate::models::CultivationCycle;

/// Repository for cultivation cycles.
///
/// Every state change also writes the owning house's status in the same
/// transaction, so `houses.status = 'cultivating'` iff a running cycle exists.
pub struct CycleRepository {
    conn: DatabaseConnection,
}

impl CycleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn running_for_house(&self, house_id: HouseId) -> Result<Option<CultivationCycle>> {
        let model = CultivationCycles::find()
            .filter(cultivation_cycles::Column::HouseId.eq(house_id.value()))
            .filter(cultivation_cycles::Column::State.eq(CycleState::Running.as_str()))
            .one(&self.conn)
            .await
            .context("Failed to query running cycle")?;

        model.map(CultivationCycle::try_from).transpose()
    }

    /// Most recently created cycle of a house, whatever its state.
    pub async fn latest_for_house(&self, house_id: HouseId) -> Result<Option<CultivationCycle>> {
        let model = CultivationCycles::find()
            .filter(cultivation_cycles::Column::HouseId.eq(house_id.value()))
            .order_by_desc(cultivation_cycles::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to query latest cycle")?;

        model.map(CultivationCycle::try_from).transpose()
    }

    /// Newest first.
    pub async fn list_for_house(&self, house_id: HouseId) -> Result<Vec<CultivationCycle>> {
        let rows = CultivationCycles::find()
            .filter(cultivation_cycles::Column::HouseId.eq(house_id.value()))
            .order_by_desc(cultivation_cycles::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list cultivation cycles")?;

        rows.into_iter().map(CultivationCycle::try_from).collect()
    }

    /// Insert a new running cycle. Returns `None` if the database already
    /// holds a running cycle for this house.
    pub async fn start(&self, house_id: HouseId) -> Result<Option<CultivationCycle>> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let active = cultivation_cycles::ActiveModel {
            house_id: Set(house_id.value()),
            state: Set(CycleState::Running.as_str().to_string()),
            started_at: Set(Some(now.clone())),
            stopped_at: Set(None),
            ..Default::default()
        };

        let model = match active.insert(&txn).await {
            Ok(model) => model,
            Err(e) if crate::db::is_unique_violation(&e) => {
                txn.rollback().await?;
                return Ok(None);
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to insert cycle")),
        };

        set_house_status(&txn, house_id, HouseStatus::Cultivating, &now).await?;
        txn.commit().await?;

        CultivationCycle::try_from(model).map(Some)
    }

    /// Mark a running cycle stopped and return the house to idle.
    pub async fn stop(&self, cycle: &CultivationCycle) -> Result<CultivationCycle> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let active = cultivation_cycles::ActiveModel {
            id: Set(cycle.id.value()),
            state: Set(CycleState::Stopped.as_str().to_string()),
            stopped_at: Set(Some(now.clone())),
            ..Default::default()
        };
        let model = active
            .update(&txn)
            .await
            .context("Failed to stop cycle")?;

        set_house_status(&txn, cycle.house_id, HouseStatus::Idle, &now).await?;
        txn.commit().await?;

        CultivationCycle::try_from(model)
    }
}

async fn set_house_status<C: ConnectionTrait>(
    conn: &C,
    house_id: HouseId,
    status: HouseStatus,
    now: &str,
) -> Result<()> {
    Houses::update_many()
        .col_expr(
            houses::Column::Status,
            sea_orm::sea_query::Expr::value(status.as_str()),
        )
        .col_expr(
            houses::Column::UpdatedAt,
            sea_orm::sea_query::Expr::value(now),
        )
        .filter(houses::Column::Id.eq(house_id.value()))
        .exec(conn)
        .await
        .context("Failed to update house status")?;
    Ok(())
}
