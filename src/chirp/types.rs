use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::ChirpModel;
use crate::auth::UserId;

/// Request body for creating a chirp; the author comes from the access token
#[derive(Debug, Deserialize)]
pub struct CreateChirpRequest {
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListChirpsQuery {
    pub author_id: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Anything other than `desc` sorts oldest first
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("desc") => SortOrder::Descending,
            _ => SortOrder::Ascending,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChirpResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: UserId,
}

impl From<ChirpModel> for ChirpResponse {
    fn from(chirp: ChirpModel) -> Self {
        Self {
            id: chirp.id,
            created_at: chirp.created_at,
            updated_at: chirp.updated_at,
            body: chirp.body,
            user_id: chirp.user_id,
        }
    }
}
