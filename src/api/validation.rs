use super::ApiError;
use crate::domain::{HouseId, UserId};

pub fn validate_house_id(id: i32) -> Result<HouseId, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid house ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(HouseId::new(id))
}

pub fn validate_user_id(id: i32) -> Result<UserId, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid user ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(UserId::new(id))
}

pub fn require_non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    if value.is_empty() {
        return Err(ApiError::validation(format!("{} is required", field)));
    }
    Ok(value)
}
