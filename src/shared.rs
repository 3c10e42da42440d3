use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::auth::{ApiKeyGuard, AuthError};
use crate::chirp::{ChirpRepository, ChirpService};
use crate::config::AuthConfig;
use crate::refresh::RefreshTokenRepository;
use crate::session::service::SessionService;
use crate::user::UserRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub session_service: Arc<SessionService>,
    pub chirp_service: Arc<ChirpService>,
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub api_key_guard: ApiKeyGuard,
}

impl AppState {
    pub fn new(
        config: &AuthConfig,
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        refresh_repository: Arc<dyn RefreshTokenRepository + Send + Sync>,
        chirp_repository: Arc<dyn ChirpRepository + Send + Sync>,
    ) -> Self {
        let session_service = Arc::new(SessionService::new(
            config,
            user_repository.clone(),
            refresh_repository,
        ));

        Self {
            session_service,
            chirp_service: Arc::new(ChirpService::new(chirp_repository)),
            user_repository,
            api_key_guard: ApiKeyGuard::new(config.api_key.clone()),
        }
    }
}

/// Client-facing errors. Deliberately coarse: a response never says why a
/// token or credential was rejected.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal,
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::MalformedToken
            | AuthError::SignatureInvalid
            | AuthError::TokenExpired
            | AuthError::SubjectInvalid
            | AuthError::InvalidIssuer
            | AuthError::MissingHeader
            | AuthError::MalformedHeader => AppError::Unauthorized,
            AuthError::EmailTaken => AppError::Conflict("Email already registered".to_string()),
            AuthError::StorageFailure(_)
            | AuthError::EntropyFailure
            | AuthError::HashingFailure
            | AuthError::SigningFailure => {
                error!(error = %e, "Authentication subsystem fault");
                AppError::Internal
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Incorrect email or password".to_string(),
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
