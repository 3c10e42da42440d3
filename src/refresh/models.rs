use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::{AuthError, AuthResult, UserId};

/// Database model for the refresh_tokens table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct RefreshTokenModel {
    pub token: String, // 64 hex chars, primary key
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>, // Set once, kept for audit
}

impl RefreshTokenModel {
    /// Creates a fresh, unrevoked record expiring `ttl` from now.
    /// Fails when the expiry falls outside the representable time range.
    pub fn new(token: String, user_id: UserId, ttl: Duration) -> AuthResult<Self> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            AuthError::StorageFailure("refresh token expiry out of range".to_string())
        })?;

        Ok(Self {
            token,
            user_id,
            created_at: now,
            updated_at: now,
            expires_at,
            revoked_at: None,
        })
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Usable only while unrevoked and strictly before expiry
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && !self.is_expired_at(now)
    }
}
