use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::validate_house_id;
use super::{ApiError, ApiResponse, AppState};
use crate::models::{House, HousePatch, User};

#[derive(Deserialize)]
pub struct CreateHouseRequest {
    pub name: String,
    pub location: String,
}

/// Lists houses visible to the caller.
///
/// # Endpoint
/// `GET /api/v1/houses`
pub async fn list_houses(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
) -> Result<Json<ApiResponse<Vec<House>>>, ApiError> {
    let houses = state.house_service().list_houses(&actor).await?;
    Ok(Json(ApiResponse::success(houses)))
}

/// Registers a house owned by the caller.
///
/// # Endpoint
/// `POST /api/v1/houses`
pub async fn create_house(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    Json(payload): Json<CreateHouseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let house = state
        .house_service()
        .create_house(&actor, &payload.name, &payload.location)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(house))))
}

/// `GET /api/v1/houses/{id}`
pub async fn get_house(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<House>>, ApiError> {
    let id = validate_house_id(id)?;
    let house = state.house_service().get_house(&actor, id).await?;
    Ok(Json(ApiResponse::success(house)))
}

/// Partially updates a house.
///
/// # Endpoint
/// `PUT /api/v1/houses/{id}`
///
/// # Errors
/// - 403 if the caller neither owns the house nor is an admin
/// - 409 when changing the status while a cultivation cycle is running
pub async fn update_house(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    Path(id): Path<i32>,
    Json(patch): Json<HousePatch>,
) -> Result<Json<ApiResponse<House>>, ApiError> {
    let id = validate_house_id(id)?;
    let house = state
        .house_service()
        .update_house(&actor, id, patch)
        .await?;
    Ok(Json(ApiResponse::success(house)))
}

/// `DELETE /api/v1/houses/{id}`
pub async fn delete_house(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = validate_house_id(id)?;
    state.house_service().delete_house(&actor, id).await?;
    Ok(Json(ApiResponse::success(())))
}
