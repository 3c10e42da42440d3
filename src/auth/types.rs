use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique principal identifier
pub type UserId = Uuid;

/// JWT claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessClaims {
    pub iss: String,
    pub sub: String, // UserId as hyphenated string
    pub iat: i64,
    pub exp: i64,
}

/// Verified identity for the lifetime of a single request
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    pub user_id: UserId,
    pub token: String,
}

impl AuthContext {
    pub fn new(user_id: UserId, token: String) -> Self {
        Self { user_id, token }
    }

    /// Ownership check for resources recorded against `owner`
    pub fn owns(&self, owner: UserId) -> bool {
        self.user_id == owner
    }
}
