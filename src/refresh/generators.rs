use rand::{rngs::OsRng, TryRngCore};
use tracing::error;

use crate::auth::{AuthError, AuthResult};

/// Number of random bytes in a refresh token (hex-encoded to twice as many chars)
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Trait for generating opaque refresh tokens
pub trait RefreshTokenGenerator: Send + Sync {
    fn generate(&self) -> AuthResult<String>;
}

/// Draws token bytes straight from the operating system CSPRNG.
///
/// Failure to read entropy is reported, never papered over with a weaker source.
pub struct OsRngTokenGenerator;

impl OsRngTokenGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OsRngTokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshTokenGenerator for OsRngTokenGenerator {
    fn generate(&self) -> AuthResult<String> {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
            error!(error = %e, "Operating system entropy source failed");
            AuthError::EntropyFailure
        })?;
        Ok(hex::encode(bytes))
    }
}
