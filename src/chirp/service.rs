use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{models::ChirpModel, repository::ChirpRepository, types::SortOrder};
use crate::{
    auth::{AuthContext, UserId},
    shared::AppError,
};

pub const MAX_CHIRP_LENGTH: usize = 140;

/// Chirp lifecycle. Mutations are scoped to the author recorded on the chirp.
pub struct ChirpService {
    chirps: Arc<dyn ChirpRepository + Send + Sync>,
}

impl ChirpService {
    pub fn new(chirps: Arc<dyn ChirpRepository + Send + Sync>) -> Self {
        Self { chirps }
    }

    #[instrument(skip(self, context, body), fields(user_id = %context.user_id))]
    pub async fn create(&self, context: &AuthContext, body: &str) -> Result<ChirpModel, AppError> {
        if body.trim().is_empty() {
            return Err(AppError::BadRequest("Chirp is empty".to_string()));
        }
        if body.chars().count() > MAX_CHIRP_LENGTH {
            return Err(AppError::BadRequest("Chirp is too long".to_string()));
        }

        let chirp = ChirpModel::new(body.to_string(), context.user_id);
        self.chirps.create_chirp(&chirp).await?;

        info!(chirp_id = %chirp.id, "Chirp created");
        Ok(chirp)
    }

    pub async fn list(
        &self,
        author: Option<UserId>,
        order: SortOrder,
    ) -> Result<Vec<ChirpModel>, AppError> {
        let mut chirps = self.chirps.list_chirps(author).await?;
        if order == SortOrder::Descending {
            chirps.reverse();
        }
        Ok(chirps)
    }

    pub async fn get(&self, chirp_id: Uuid) -> Result<ChirpModel, AppError> {
        self.chirps
            .get_chirp(chirp_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Chirp not found".to_string()))
    }

    /// Deletes a chirp on behalf of its author.
    /// Unknown chirp is `NotFound`; someone else's chirp is `Forbidden`.
    #[instrument(skip(self, context), fields(user_id = %context.user_id))]
    pub async fn delete(&self, context: &AuthContext, chirp_id: Uuid) -> Result<(), AppError> {
        let chirp = self.get(chirp_id).await?;

        if !context.owns(chirp.user_id) {
            warn!(chirp_id = %chirp_id, owner = %chirp.user_id, "Delete refused: not the author");
            return Err(AppError::Forbidden);
        }

        if !self.chirps.delete_chirp(chirp_id).await? {
            return Err(AppError::NotFound("Chirp not found".to_string()));
        }

        info!(chirp_id = %chirp_id, "Chirp deleted");
        Ok(())
    }
}
