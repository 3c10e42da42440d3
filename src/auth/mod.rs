//! Credential handling: password hashing, access tokens, header extraction
//! and the axum middleware built on them.

// Public API - what other modules can use
pub use api_key::ApiKeyGuard;
pub use errors::{AuthError, AuthResult};
pub use extract::{extract_api_key, extract_bearer_token};
pub use middleware::{jwt_auth, require_api_key};
pub use password::{hash_password, verify_password};
pub use token::AccessTokenIssuer;
pub use types::{AccessClaims, AuthContext, UserId};

// Internal modules
mod api_key;
pub mod errors;
mod extract;
mod middleware;
pub mod password;
pub mod token;
pub mod types;
