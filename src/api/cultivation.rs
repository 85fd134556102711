use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::validate_house_id;
use super::{ApiError, ApiResponse, AppState, CultivationStatusDto};
use crate::domain::CycleState;
use crate::models::{CultivationCycle, User};

#[derive(Deserialize)]
pub struct CultivationRequest {
    pub house_id: i32,
}

/// POST /cultivation/start
pub async fn start(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    Json(payload): Json<CultivationRequest>,
) -> Result<Json<ApiResponse<CultivationCycle>>, ApiError> {
    let house_id = validate_house_id(payload.house_id)?;
    let cycle = state.house_service().start(&actor, house_id).await?;
    Ok(Json(ApiResponse::success(cycle)))
}

/// POST /cultivation/stop
pub async fn stop(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    Json(payload): Json<CultivationRequest>,
) -> Result<Json<ApiResponse<CultivationCycle>>, ApiError> {
    let house_id = validate_house_id(payload.house_id)?;
    let cycle = state.house_service().stop(&actor, house_id).await?;
    Ok(Json(ApiResponse::success(cycle)))
}

/// GET /cultivation/status?house_id=
///
/// Current house status plus the cycle history, newest first.
pub async fn status(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    Query(query): Query<CultivationRequest>,
) -> Result<Json<ApiResponse<CultivationStatusDto>>, ApiError> {
    let house_id = validate_house_id(query.house_id)?;
    let house = state.house_service().get_house(&actor, house_id).await?;
    let cycles = state.house_service().cycles(&actor, house_id).await?;

    let current_cycle = cycles
        .iter()
        .find(|c| c.state == CycleState::Running)
        .map(|c| c.id);

    Ok(Json(ApiResponse::success(CultivationStatusDto {
        house_id,
        house_status: house.status,
        current_cycle,
        cycles,
    })))
}
