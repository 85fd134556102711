//! Domain types for users, houses and cultivation cycles.
//!
//! Identifiers follow the Newtype pattern so a `HouseId` can never be passed
//! where a `UserId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }
    };
}

entity_id!(
    /// Unique identifier of a user account.
    UserId
);
entity_id!(
    /// Unique identifier of a greenhouse.
    HouseId
);
entity_id!(
    /// Unique identifier of one cultivation cycle instance.
    CycleId
);

/// Error returned when a stored enum value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HouseStatus {
    #[default]
    Idle,
    Cultivating,
    Maintenance,
}

impl HouseStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Cultivating => "cultivating",
            Self::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for HouseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HouseStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "cultivating" => Ok(Self::Cultivating),
            "maintenance" => Ok(Self::Maintenance),
            other => Err(UnknownVariant::new("house status", other)),
        }
    }
}

/// Lifecycle of a single cultivation cycle.
///
/// `Stopped` is terminal: a stopped cycle is never restarted, a new instance
/// is created instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    #[default]
    NotStarted,
    Running,
    Stopped,
}

impl CycleState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }

    /// Whether `self -> next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted | Self::Stopped, Self::Running) | (Self::Running, Self::Stopped)
        )
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CycleState {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            other => Err(UnknownVariant::new("cycle state", other)),
        }
    }
}

/// The state-machine or uniqueness rule a rejected request ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    DuplicateUsername,
    AlreadyRunning,
    NotRunning,
    ActiveCycle,
    UnderMaintenance,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::DuplicateUsername => "username is already taken",
            Self::AlreadyRunning => "a cultivation cycle is already running for this house",
            Self::NotRunning => "no cultivation cycle is running for this house",
            Self::ActiveCycle => "the house has a running cultivation cycle; stop it first",
            Self::UnderMaintenance => "the house is under maintenance",
        };
        f.write_str(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_do_not_mix_but_convert() {
        let user = UserId::new(7);
        let house = HouseId::from(7);
        assert_eq!(user.value(), house.value());
        assert_eq!(i32::from(user), 7);
        assert_eq!(house.to_string(), "7");
    }

    #[test]
    fn id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&HouseId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: HouseId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, HouseId::new(42));
    }

    #[test]
    fn enums_round_trip_through_storage_strings() {
        for role in [Role::Admin, Role::User] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        for status in [
            HouseStatus::Idle,
            HouseStatus::Cultivating,
            HouseStatus::Maintenance,
        ] {
            assert_eq!(status.as_str().parse::<HouseStatus>().unwrap(), status);
        }
        assert!("superuser".parse::<Role>().is_err());
        assert_eq!(
            serde_json::to_string(&CycleState::NotStarted).unwrap(),
            "\"not_started\""
        );
    }

    #[test]
    fn cycle_transitions() {
        assert!(CycleState::NotStarted.can_transition_to(CycleState::Running));
        assert!(CycleState::Stopped.can_transition_to(CycleState::Running));
        assert!(CycleState::Running.can_transition_to(CycleState::Stopped));
        assert!(!CycleState::Running.can_transition_to(CycleState::Running));
        assert!(!CycleState::NotStarted.can_transition_to(CycleState::Stopped));
        assert!(!CycleState::Stopped.can_transition_to(CycleState::Stopped));
    }
}
