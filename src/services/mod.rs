pub mod password;
pub use password::PasswordHasher;

pub mod token_service;
pub use token_service::{IssuedToken, TokenRejection, TokenService, VerifiedToken};

pub mod credential_store;
pub mod credential_store_impl;
pub mod memory_credential_store;
pub use credential_store::{CredentialError, CredentialStore};
pub use credential_store_impl::SeaOrmCredentialStore;
pub use memory_credential_store::MemoryCredentialStore;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, Forbidden, LoginResult, Requirement, authorize};
pub use auth_service_impl::{SessionAuthService, validate_new_user};

pub mod house_locks;
pub use house_locks::HouseLocks;

pub mod sensor_feed;
pub use sensor_feed::{InMemorySensorFeed, SensorFeed};

pub mod house_service;
pub mod house_service_impl;
pub use house_service::{HouseService, RegistryError};
pub use house_service_impl::SeaOrmHouseService;
