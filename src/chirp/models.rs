use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::UserId;

/// Database model for the chirps table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct ChirpModel {
    pub id: Uuid,
    pub body: String,
    pub user_id: UserId, // Author, the only identity allowed to delete it
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChirpModel {
    pub fn new(body: String, user_id: UserId) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            body,
            user_id,
            created_at: now,
            updated_at: now,
        }
    }
}
