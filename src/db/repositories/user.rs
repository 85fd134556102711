use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::{Role, UserId};
use crate::entities::{prelude::*, users};
use crate::models::{User, UserRecord};

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get the credential row for a username (case-sensitive match)
    pub async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        user.map(UserRecord::try_from).transpose()
    }

    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = Users::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        user.map(User::try_from).transpose()
    }

    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = Users::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// Insert a new user with an already hashed password.
    /// Returns `None` when the username is taken.
    pub async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
        role: Role,
    ) -> Result<Option<User>> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            email: Set(email.to_string()),
            role: Set(role.as_str().to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(User::try_from(model)?)),
            Err(e) if crate::db::is_unique_violation(&e) => Ok(None),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to insert user")),
        }
    }
}
