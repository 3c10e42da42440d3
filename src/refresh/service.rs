use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    generators::{OsRngTokenGenerator, RefreshTokenGenerator},
    models::RefreshTokenModel,
    repository::RefreshTokenRepository,
};
use crate::auth::{AuthResult, UserId};

/// Generates, stores, looks up and revokes refresh tokens
pub struct RefreshTokenManager {
    generator: Arc<dyn RefreshTokenGenerator>,
    repository: Arc<dyn RefreshTokenRepository + Send + Sync>,
    ttl: Duration,
}

impl RefreshTokenManager {
    pub fn new(repository: Arc<dyn RefreshTokenRepository + Send + Sync>, ttl: Duration) -> Self {
        Self::with_generator(Arc::new(OsRngTokenGenerator::new()), repository, ttl)
    }

    pub fn with_generator(
        generator: Arc<dyn RefreshTokenGenerator>,
        repository: Arc<dyn RefreshTokenRepository + Send + Sync>,
        ttl: Duration,
    ) -> Self {
        Self {
            generator,
            repository,
            ttl,
        }
    }

    /// Produces a new 64-char hex token without storing it
    pub fn generate(&self) -> AuthResult<String> {
        self.generator.generate()
    }

    /// Stores `token` for `user_id`, expiring `ttl` from now
    #[instrument(skip(self, token))]
    pub async fn persist(
        &self,
        token: &str,
        user_id: UserId,
        ttl: Duration,
    ) -> AuthResult<RefreshTokenModel> {
        let model = RefreshTokenModel::new(token.to_string(), user_id, ttl)?;
        self.repository.create_refresh_token(&model).await?;

        debug!(user_id = %user_id, expires_at = %model.expires_at, "Refresh token persisted");
        Ok(model)
    }

    /// Generates and persists a token with the configured lifetime
    #[instrument(skip(self))]
    pub async fn issue(&self, user_id: UserId) -> AuthResult<String> {
        let token = self.generate()?;
        self.persist(&token, user_id, self.ttl).await?;
        Ok(token)
    }

    /// Returns the record only while it is unrevoked and unexpired.
    /// Revoked, expired and unknown tokens all come back as `None`.
    #[instrument(skip(self, token))]
    pub async fn lookup(&self, token: &str) -> AuthResult<Option<RefreshTokenModel>> {
        let record = self.repository.find_refresh_token(token).await?;
        let now = Utc::now();

        Ok(record.filter(|r| {
            let usable = r.is_usable_at(now);
            if !usable {
                debug!(
                    user_id = %r.user_id,
                    revoked = r.is_revoked(),
                    "Refresh token record exists but is not usable"
                );
            }
            usable
        }))
    }

    /// Marks the token revoked. Revoking twice returns the first revocation.
    #[instrument(skip(self, token))]
    pub async fn revoke(&self, token: &str) -> AuthResult<Option<RefreshTokenModel>> {
        let record = self
            .repository
            .revoke_refresh_token(token, Utc::now())
            .await?;

        if let Some(r) = &record {
            info!(user_id = %r.user_id, "Refresh token revoked");
        }
        Ok(record)
    }
}
