use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::models::ChirpModel;
use crate::auth::{AuthError, AuthResult, UserId};

/// Trait for chirp persistence
#[async_trait]
pub trait ChirpRepository {
    async fn create_chirp(&self, chirp: &ChirpModel) -> AuthResult<()>;
    async fn get_chirp(&self, chirp_id: Uuid) -> AuthResult<Option<ChirpModel>>;

    /// All chirps, or only those by `author`, oldest first
    async fn list_chirps(&self, author: Option<UserId>) -> AuthResult<Vec<ChirpModel>>;

    /// Returns false when no chirp had that id
    async fn delete_chirp(&self, chirp_id: Uuid) -> AuthResult<bool>;
}

/// In-memory implementation of ChirpRepository for development and testing
pub struct InMemoryChirpRepository {
    chirps: RwLock<HashMap<Uuid, ChirpModel>>,
}

impl Default for InMemoryChirpRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryChirpRepository {
    pub fn new() -> Self {
        Self {
            chirps: RwLock::new(HashMap::new()),
        }
    }

    pub async fn chirp_count(&self) -> usize {
        self.chirps.read().await.len()
    }
}

#[async_trait]
impl ChirpRepository for InMemoryChirpRepository {
    #[instrument(skip(self, chirp))]
    async fn create_chirp(&self, chirp: &ChirpModel) -> AuthResult<()> {
        debug!(chirp_id = %chirp.id, user_id = %chirp.user_id, "Creating chirp in memory");

        let mut chirps = self.chirps.write().await;
        if chirps.contains_key(&chirp.id) {
            return Err(AuthError::StorageFailure("Chirp already exists".to_string()));
        }
        chirps.insert(chirp.id, chirp.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_chirp(&self, chirp_id: Uuid) -> AuthResult<Option<ChirpModel>> {
        Ok(self.chirps.read().await.get(&chirp_id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_chirps(&self, author: Option<UserId>) -> AuthResult<Vec<ChirpModel>> {
        let chirps = self.chirps.read().await;
        let mut found: Vec<ChirpModel> = chirps
            .values()
            .filter(|c| author.map_or(true, |a| c.user_id == a))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(found)
    }

    #[instrument(skip(self))]
    async fn delete_chirp(&self, chirp_id: Uuid) -> AuthResult<bool> {
        let removed = self.chirps.write().await.remove(&chirp_id).is_some();
        debug!(chirp_id = %chirp_id, removed, "Deleted chirp in memory");
        Ok(removed)
    }
}

/// PostgreSQL implementation of chirp repository
pub struct PostgresChirpRepository {
    pool: PgPool,
}

impl PostgresChirpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn chirp_from_row(row: &sqlx::postgres::PgRow) -> ChirpModel {
    ChirpModel {
        id: row.get("id"),
        body: row.get("body"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl ChirpRepository for PostgresChirpRepository {
    #[instrument(skip(self, chirp))]
    async fn create_chirp(&self, chirp: &ChirpModel) -> AuthResult<()> {
        debug!(chirp_id = %chirp.id, user_id = %chirp.user_id, "Creating chirp in database");

        sqlx::query(
            "INSERT INTO chirps (id, body, user_id, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)"
        )
        .bind(chirp.id)
        .bind(&chirp.body)
        .bind(chirp.user_id)
        .bind(chirp.created_at)
        .bind(chirp.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create chirp in database");
            AuthError::from(e)
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_chirp(&self, chirp_id: Uuid) -> AuthResult<Option<ChirpModel>> {
        let row = sqlx::query(
            "SELECT id, body, user_id, created_at, updated_at FROM chirps WHERE id = $1",
        )
        .bind(chirp_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, chirp_id = %chirp_id, "Failed to fetch chirp");
            AuthError::from(e)
        })?;

        Ok(row.as_ref().map(chirp_from_row))
    }

    #[instrument(skip(self))]
    async fn list_chirps(&self, author: Option<UserId>) -> AuthResult<Vec<ChirpModel>> {
        let rows = sqlx::query(
            r#"
            SELECT id, body, user_id, created_at, updated_at
            FROM chirps
            WHERE $1::uuid IS NULL OR user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(author)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to list chirps");
            AuthError::from(e)
        })?;

        Ok(rows.iter().map(chirp_from_row).collect())
    }

    #[instrument(skip(self))]
    async fn delete_chirp(&self, chirp_id: Uuid) -> AuthResult<bool> {
        let result = sqlx::query("DELETE FROM chirps WHERE id = $1")
            .bind(chirp_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, chirp_id = %chirp_id, "Failed to delete chirp");
                AuthError::from(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}
