use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::RefreshTokenModel;
use crate::auth::{AuthError, AuthResult};

/// Trait for refresh token persistence.
///
/// Implementations make each call atomic per row; callers never hold a record
/// across two calls.
#[async_trait]
pub trait RefreshTokenRepository {
    async fn create_refresh_token(&self, token: &RefreshTokenModel) -> AuthResult<()>;

    /// Exact-match fetch regardless of revocation or expiry
    async fn find_refresh_token(&self, token: &str) -> AuthResult<Option<RefreshTokenModel>>;

    /// Stamps `revoked_at` and `updated_at` with `revoked_at` on first revocation.
    /// An already-revoked record is returned unchanged.
    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> AuthResult<Option<RefreshTokenModel>>;
}

/// In-memory implementation of RefreshTokenRepository for development and testing
pub struct InMemoryRefreshTokenRepository {
    tokens: RwLock<HashMap<String, RefreshTokenModel>>,
}

impl Default for InMemoryRefreshTokenRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a repository with pre-populated records
    pub fn with_tokens(tokens: Vec<RefreshTokenModel>) -> Self {
        let token_map = tokens
            .into_iter()
            .map(|t| (t.token.clone(), t))
            .collect();

        Self {
            tokens: RwLock::new(token_map),
        }
    }

    /// Number of stored records, revoked ones included
    pub async fn token_count(&self) -> usize {
        self.tokens.read().await.len()
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    #[instrument(skip(self, token))]
    async fn create_refresh_token(&self, token: &RefreshTokenModel) -> AuthResult<()> {
        debug!(user_id = %token.user_id, "Storing refresh token in memory");

        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.token) {
            warn!(user_id = %token.user_id, "Refresh token already exists in memory");
            return Err(AuthError::StorageFailure(
                "Refresh token already exists".to_string(),
            ));
        }
        tokens.insert(token.token.clone(), token.clone());

        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn find_refresh_token(&self, token: &str) -> AuthResult<Option<RefreshTokenModel>> {
        let found = self.tokens.read().await.get(token).cloned();
        debug!(found = found.is_some(), "Looked up refresh token in memory");
        Ok(found)
    }

    #[instrument(skip(self, token))]
    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> AuthResult<Option<RefreshTokenModel>> {
        let mut tokens = self.tokens.write().await;
        let Some(record) = tokens.get_mut(token) else {
            debug!("Refresh token not found for revocation in memory");
            return Ok(None);
        };

        if record.revoked_at.is_none() {
            record.revoked_at = Some(revoked_at);
            record.updated_at = revoked_at;
            debug!(user_id = %record.user_id, "Refresh token revoked in memory");
        } else {
            debug!(user_id = %record.user_id, "Refresh token was already revoked");
        }

        Ok(Some(record.clone()))
    }
}

/// PostgreSQL implementation of refresh token repository
pub struct PostgresRefreshTokenRepository {
    pool: PgPool,
}

impl PostgresRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn refresh_token_from_row(row: &sqlx::postgres::PgRow) -> RefreshTokenModel {
    RefreshTokenModel {
        token: row.get("token"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        expires_at: row.get("expires_at"),
        revoked_at: row.get("revoked_at"),
    }
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    #[instrument(skip(self, token))]
    async fn create_refresh_token(&self, token: &RefreshTokenModel) -> AuthResult<()> {
        debug!(user_id = %token.user_id, "Storing refresh token in database");

        sqlx::query(
            "INSERT INTO refresh_tokens (token, user_id, created_at, updated_at, expires_at, revoked_at) VALUES ($1, $2, $3, $4, $5, $6)"
        )
        .bind(&token.token)
        .bind(token.user_id)
        .bind(token.created_at)
        .bind(token.updated_at)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to store refresh token in database");
            AuthError::from(e)
        })?;

        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn find_refresh_token(&self, token: &str) -> AuthResult<Option<RefreshTokenModel>> {
        let row = sqlx::query(
            "SELECT token, user_id, created_at, updated_at, expires_at, revoked_at FROM refresh_tokens WHERE token = $1"
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch refresh token from database");
            AuthError::from(e)
        })?;

        debug!(found = row.is_some(), "Looked up refresh token in database");
        Ok(row.as_ref().map(refresh_token_from_row))
    }

    #[instrument(skip(self, token))]
    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> AuthResult<Option<RefreshTokenModel>> {
        // Single statement so concurrent revokes cannot both stamp the row
        let row = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET updated_at = CASE WHEN revoked_at IS NULL THEN $2 ELSE updated_at END,
                revoked_at = COALESCE(revoked_at, $2)
            WHERE token = $1
            RETURNING token, user_id, created_at, updated_at, expires_at, revoked_at
            "#,
        )
        .bind(token)
        .bind(revoked_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to revoke refresh token in database");
            AuthError::from(e)
        })?;

        Ok(row.as_ref().map(refresh_token_from_row))
    }
}
