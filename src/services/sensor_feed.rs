//! Sensor-ingestion contract.
//!
//! Readings come from field devices outside this service. The registry only
//! needs the most recent sample per house.

use dashmap::DashMap;

use crate::domain::HouseId;
use crate::models::SensorReading;

#[async_trait::async_trait]
pub trait SensorFeed: Send + Sync {
    async fn record(&self, reading: SensorReading);

    async fn latest(&self, house_id: HouseId) -> Option<SensorReading>;

    /// Discards everything held for a house.
    async fn forget(&self, house_id: HouseId);
}

/// Keeps the newest reading per house in memory.
#[derive(Default)]
pub struct InMemorySensorFeed {
    latest: DashMap<HouseId, SensorReading>,
}

impl InMemorySensorFeed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SensorFeed for InMemorySensorFeed {
    async fn record(&self, reading: SensorReading) {
        self.latest
            .entry(reading.house_id)
            .and_modify(|current| {
                if reading.recorded_at >= current.recorded_at {
                    *current = reading.clone();
                }
            })
            .or_insert_with(|| reading.clone());
    }

    async fn latest(&self, house_id: HouseId) -> Option<SensorReading> {
        self.latest.get(&house_id).map(|r| r.value().clone())
    }

    async fn forget(&self, house_id: HouseId) {
        self.latest.remove(&house_id);
    }
}
