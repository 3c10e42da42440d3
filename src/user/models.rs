use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::UserId;

/// Database model for the users table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct UserModel {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String, // Argon2id PHC string, never plaintext
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_chirpy_red: bool,
}

impl UserModel {
    /// Creates a new user with a generated identity
    pub fn new(email: String, hashed_password: String) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            email,
            hashed_password,
            created_at: now,
            updated_at: now,
            is_chirpy_red: false,
        }
    }
}
