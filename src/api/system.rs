use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use super::{ApiResponse, AppState, HealthDto, ServiceInfoDto};

/// Service name and version.
///
/// # Endpoint
/// `GET /`
pub async fn root() -> Json<ApiResponse<ServiceInfoDto>> {
    Json(ApiResponse::success(ServiceInfoDto {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        api: "/api/v1",
    }))
}

/// Liveness plus a database round trip.
///
/// # Endpoint
/// `GET /health`
///
/// # Response
/// 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime_seconds = state.start_time.elapsed().as_secs();

    let (status, dto) = match state.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            HealthDto {
                status: "ok",
                database: "ok",
                uptime_seconds,
            },
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check database ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                HealthDto {
                    status: "degraded",
                    database: "unavailable",
                    uptime_seconds,
                },
            )
        }
    };

    (status, Json(ApiResponse::success(dto)))
}
