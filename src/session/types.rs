use serde::{Deserialize, Serialize};

use crate::auth::UserId;
use crate::user::UserModel;

/// Body for registration, login and password change
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Issued access + refresh pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenPair {
    pub token: String,         // Access token (JWT)
    pub refresh_token: String, // Opaque 64-char hex
}

/// Response for registration and login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub id: UserId,
    pub email: String,
    pub is_chirpy_red: bool,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

impl LoginResponse {
    pub fn new(user: &UserModel, tokens: TokenPair) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            is_chirpy_red: user.is_chirpy_red,
            tokens,
        }
    }
}

/// Response for the refresh endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenResponse {
    pub token: String,
}

/// Public view of a user after a password change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<&UserModel> for UserResponse {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

/// Trusted-service webhook payload
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookRequest {
    pub event: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookData {
    pub user_id: UserId,
}
