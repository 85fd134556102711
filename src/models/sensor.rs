use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::HouseId;

/// One environment sample pushed by the sensor-ingestion feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub house_id: HouseId,
    pub temperature: f64,
    pub humidity: f64,
    pub light: f64,
    pub soil_moisture: f64,
    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}
