use serde::{Deserialize, Serialize};

use crate::domain::{CycleId, CycleState, HouseId, HouseStatus, UserId};
use crate::entities::{cultivation_cycles, houses};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct House {
    pub id: HouseId,
    pub owner_id: UserId,
    pub name: String,
    pub location: String,
    pub status: HouseStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial update of a house. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HousePatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub status: Option<HouseStatus>,
}

impl HousePatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.location.is_none() && self.status.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CultivationCycle {
    pub id: CycleId,
    pub house_id: HouseId,
    pub state: CycleState,
    pub started_at: Option<String>,
    pub stopped_at: Option<String>,
}

impl TryFrom<houses::Model> for House {
    type Error = anyhow::Error;

    fn try_from(model: houses::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: HouseId::new(model.id),
            owner_id: UserId::new(model.owner_id),
            name: model.name,
            location: model.location,
            status: model.status.parse()?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl TryFrom<cultivation_cycles::Model> for CultivationCycle {
    type Error = anyhow::Error;

    fn try_from(model: cultivation_cycles::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CycleId::new(model.id),
            house_id: HouseId::new(model.house_id),
            state: model.state.parse()?,
            started_at: model.started_at,
            stopped_at: model.stopped_at,
        })
    }
}
