use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ConflictKind, CycleId, HouseId, HouseStatus, Role, UserId};
use crate::models::{CultivationCycle, User};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ConflictKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            kind: None,
            reason: None,
            error: None,
        }
    }

    pub fn error(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            kind: Some(kind),
            reason: None,
            error: Some(message.into()),
        }
    }
}

/// Public view of an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
pub struct CultivationStatusDto {
    pub house_id: HouseId,
    pub house_status: HouseStatus,
    pub current_cycle: Option<CycleId>,
    pub cycles: Vec<CultivationCycle>,
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub database: &'static str,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfoDto {
    pub name: &'static str,
    pub version: &'static str,
    pub api: &'static str,
}
