use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::domain::ConflictKind;
use crate::services::{AuthError, RegistryError};

#[derive(Debug)]
pub enum ApiError {
    InvalidCredentials,

    Unauthorized(String),

    Forbidden(String),

    NotFound(String),

    Conflict(ConflictKind),

    ValidationError(String),

    Unavailable(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidCredentials => write!(f, "Invalid username or password"),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(kind) => write!(f, "Conflict: {}", kind),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Unavailable(msg) => write!(f, "Unavailable: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Machine-readable category, stable across message changes.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::Unauthorized(_) => "unauthenticated",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::ValidationError(_) => "validation",
            ApiError::Unavailable(_) => "unavailable",
            ApiError::InternalError(_) => "internal",
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut reason = None;

        let error_message = match &self {
            ApiError::InvalidCredentials => "Invalid username or password".to_string(),
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::ValidationError(msg) => msg.clone(),
            ApiError::Conflict(kind) => {
                reason = Some(*kind);
                kind.to_string()
            }
            ApiError::Unavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                "Service temporarily unavailable, try again later".to_string()
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
        };

        let mut body = ApiResponse::<()>::error(self.kind(), error_message);
        body.reason = reason;
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::Unauthenticated(msg) => Self::Unauthorized(msg),
            AuthError::Forbidden(msg) => Self::Forbidden(msg),
            AuthError::UserNotFound(id) => Self::not_found("User", id),
            AuthError::Conflict(kind) => Self::Conflict(kind),
            AuthError::Validation(msg) => Self::validation(msg),
            AuthError::Unavailable(msg) => Self::Unavailable(msg),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => Self::not_found("House", id),
            RegistryError::OwnerNotFound(id) => Self::not_found("User", id),
            RegistryError::Forbidden(msg) => Self::Forbidden(msg),
            RegistryError::Conflict(kind) => Self::Conflict(kind),
            RegistryError::Validation(msg) => Self::validation(msg),
            RegistryError::Unavailable(msg) => Self::Unavailable(msg),
        }
    }
}
