use serde::{Deserialize, Serialize};

use crate::domain::{Role, UserId};
use crate::entities::users;

/// A user account as seen by everything outside the credential store.
/// Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

/// Stored credential row: the user plus its Argon2 PHC hash.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

/// Input for account creation. The password is still in clear text here and
/// is hashed by the credential store before anything is persisted.
#[derive(Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl TryFrom<users::Model> for UserRecord {
    type Error = anyhow::Error;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        let role = model.role.parse()?;
        Ok(Self {
            user: User {
                id: UserId::new(model.id),
                username: model.username,
                email: model.email,
                role,
                created_at: model.created_at,
                updated_at: model.updated_at,
            },
            password_hash: model.password_hash,
        })
    }
}

impl TryFrom<users::Model> for User {
    type Error = anyhow::Error;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        UserRecord::try_from(model).map(|record| record.user)
    }
}
