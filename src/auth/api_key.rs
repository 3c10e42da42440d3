use axum::http::HeaderMap;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::{
    errors::{AuthError, AuthResult},
    extract::extract_api_key,
};

/// Guards endpoints reserved for a trusted external service
#[derive(Clone)]
pub struct ApiKeyGuard {
    expected: Option<String>,
}

impl ApiKeyGuard {
    pub fn new(expected: Option<String>) -> Self {
        Self {
            expected: expected.filter(|key| !key.is_empty()),
        }
    }

    /// Accepts the request only if its `ApiKey` credential equals the configured key.
    /// With no key configured every request is rejected.
    pub fn verify(&self, headers: &HeaderMap) -> AuthResult<()> {
        let presented = extract_api_key(headers)?;

        let Some(expected) = self.expected.as_deref() else {
            warn!("API key presented but no key is configured");
            return Err(AuthError::InvalidCredentials);
        };

        if bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
            debug!("API key accepted");
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}
