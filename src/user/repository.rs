use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::UserModel;
use crate::auth::{AuthError, AuthResult, UserId};

/// Trait for user credential persistence
#[async_trait]
pub trait UserRepository {
    async fn create_user(&self, user: &UserModel) -> AuthResult<()>;
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserModel>>;
    async fn get_user(&self, user_id: UserId) -> AuthResult<Option<UserModel>>;

    /// Replaces the stored hash wholesale
    async fn update_password(
        &self,
        user_id: UserId,
        hashed_password: &str,
    ) -> AuthResult<Option<UserModel>>;

    async fn upgrade_user(&self, user_id: UserId) -> AuthResult<Option<UserModel>>;
}

/// In-memory implementation of UserRepository for development and testing
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, UserModel>>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> AuthResult<()> {
        debug!(user_id = %user.id, "Creating user in memory");

        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            warn!(user_id = %user.id, "Email already registered in memory");
            return Err(AuthError::EmailTaken);
        }
        if users.contains_key(&user.id) {
            return Err(AuthError::StorageFailure("User already exists".to_string()));
        }
        users.insert(user.id, user.clone());

        Ok(())
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserModel>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: UserId) -> AuthResult<Option<UserModel>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    #[instrument(skip(self, hashed_password))]
    async fn update_password(
        &self,
        user_id: UserId,
        hashed_password: &str,
    ) -> AuthResult<Option<UserModel>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&user_id) else {
            warn!(user_id = %user_id, "User not found for password change in memory");
            return Ok(None);
        };

        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();
        debug!(user_id = %user_id, "Password replaced in memory");

        Ok(Some(user.clone()))
    }

    #[instrument(skip(self))]
    async fn upgrade_user(&self, user_id: UserId) -> AuthResult<Option<UserModel>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&user_id).map(|user| {
            user.is_chirpy_red = true;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, email, hashed_password, created_at, updated_at, is_chirpy_red";

fn user_from_row(row: &sqlx::postgres::PgRow) -> UserModel {
    UserModel {
        id: row.get("id"),
        email: row.get("email"),
        hashed_password: row.get("hashed_password"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        is_chirpy_red: row.get("is_chirpy_red"),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user))]
    async fn create_user(&self, user: &UserModel) -> AuthResult<()> {
        debug!(user_id = %user.id, "Creating user in database");

        sqlx::query(
            "INSERT INTO users (id, email, hashed_password, created_at, updated_at, is_chirpy_red) VALUES ($1, $2, $3, $4, $5, $6)"
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.is_chirpy_red)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AuthError::EmailTaken;
            }
            warn!(error = %e, "Failed to create user in database");
            AuthError::from(e)
        })?;

        Ok(())
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserModel>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to fetch user by email");
                AuthError::from(e)
            })?;

        Ok(row.as_ref().map(user_from_row))
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: UserId) -> AuthResult<Option<UserModel>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = %user_id, "Failed to fetch user");
                AuthError::from(e)
            })?;

        Ok(row.as_ref().map(user_from_row))
    }

    #[instrument(skip(self, hashed_password))]
    async fn update_password(
        &self,
        user_id: UserId,
        hashed_password: &str,
    ) -> AuthResult<Option<UserModel>> {
        let row = sqlx::query(&format!(
            "UPDATE users SET hashed_password = $1, updated_at = $2 WHERE id = $3 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(hashed_password)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %user_id, "Failed to change password");
            AuthError::from(e)
        })?;

        Ok(row.as_ref().map(user_from_row))
    }

    #[instrument(skip(self))]
    async fn upgrade_user(&self, user_id: UserId) -> AuthResult<Option<UserModel>> {
        let row = sqlx::query(&format!(
            "UPDATE users SET is_chirpy_red = TRUE, updated_at = $1 WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %user_id, "Failed to upgrade user");
            AuthError::from(e)
        })?;

        Ok(row.as_ref().map(user_from_row))
    }
}
