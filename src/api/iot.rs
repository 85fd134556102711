//! Sensor readings pushed by field devices.

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::validate_house_id;
use super::{ApiError, ApiResponse, AppState};
use crate::models::{SensorReading, User};

#[derive(Deserialize)]
pub struct LatestQuery {
    pub house_id: i32,
}

/// POST /iot/data
pub async fn record(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    Json(reading): Json<SensorReading>,
) -> Result<impl IntoResponse, ApiError> {
    validate_house_id(reading.house_id.value())?;
    state
        .house_service()
        .record_reading(&actor, reading.clone())
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(reading))))
}

/// GET /iot/data?house_id=
pub async fn latest(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    Query(query): Query<LatestQuery>,
) -> Result<Json<ApiResponse<Option<SensorReading>>>, ApiError> {
    let house_id = validate_house_id(query.house_id)?;
    let reading = state
        .house_service()
        .latest_reading(&actor, house_id)
        .await?;
    Ok(Json(ApiResponse::success(reading)))
}
