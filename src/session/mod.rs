// Public API - what other modules can use
pub use service::SessionService;
pub use types::{AccessTokenResponse, CredentialsRequest, LoginResponse, TokenPair};

// Internal modules
pub mod handlers;
pub mod service;
pub mod types;
