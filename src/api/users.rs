//! Admin-only account management.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::validation::validate_user_id;
use super::{ApiError, ApiResponse, AppState, UserDto};
use crate::models::{NewUser, User};

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = state.auth_service().list_users(&actor).await?;
    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

/// GET /users/{id}
///
/// Admins may look up anyone; other users only themselves.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = validate_user_id(id)?;
    let user = state.auth_service().get_user(&actor, id).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// POST /users
///
/// Creates an account with any role. `role` defaults to `user`.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<User>,
    Json(payload): Json<NewUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth_service().create_user(&actor, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}
