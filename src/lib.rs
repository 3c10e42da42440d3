// Library crate for the chirpy authentication and session subsystem
// This file exposes the public API for integration tests

pub mod auth;
pub mod chirp;
pub mod config;
pub mod refresh;
pub mod router;
pub mod session;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use auth::{AccessTokenIssuer, AuthContext, AuthError, UserId};
pub use chirp::{ChirpService, InMemoryChirpRepository};
pub use config::AuthConfig;
pub use refresh::{InMemoryRefreshTokenRepository, RefreshTokenManager};
pub use router::build_router;
pub use session::SessionService;
pub use shared::{AppError, AppState};
pub use user::InMemoryUserRepository;
