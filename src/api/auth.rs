use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::require_non_empty;
use super::{ApiError, ApiResponse, AppState, LoginResponse, UserDto};
use crate::models::User;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves `Authorization: Bearer <token>` to a [`User`] and stores it in the
/// request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;

    let user = state.auth_service().resolve(&token).await?;
    tracing::Span::current().record("user_id", user.id.value());

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /login
/// Verifies credentials and returns a signed access token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    require_non_empty("Username", &payload.username)?;
    require_non_empty("Password", &payload.password)?;

    let result = state
        .auth_service()
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(LoginResponse {
        access_token: result.access_token,
        token_type: "bearer".to_string(),
        expires_at: result.expires_at,
        user: result.user.into(),
    }))
}

/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .auth_service()
        .register(&payload.username, &payload.password, &payload.email)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

/// GET /me
pub async fn me(Extension(user): Extension<User>) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::success(user.into()))
}

/// POST /logout
/// Revokes the presented token. Not behind `auth_middleware`: a token that is
/// already revoked, expired or unknown still logs out successfully.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let token = extract_bearer_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;

    state.auth_service().logout(&token).await?;
    Ok(Json(ApiResponse::success(())))
}
