// Public API - what other modules can use
pub use generators::{OsRngTokenGenerator, RefreshTokenGenerator};
pub use models::RefreshTokenModel;
pub use repository::{
    InMemoryRefreshTokenRepository, PostgresRefreshTokenRepository, RefreshTokenRepository,
};
pub use service::RefreshTokenManager;

// Internal modules
pub mod generators;
pub mod models;
pub mod repository;
pub mod service;
