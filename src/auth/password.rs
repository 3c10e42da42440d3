use argon2::{
    password_hash::{
        rand_core::{OsRng, RngCore},
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use tracing::{debug, error};

use super::errors::{AuthError, AuthResult};

const SALT_LEN: usize = 16;

/// Well-formed Argon2id hash that matches no password. Verified against when an
/// account lookup misses so both login failure paths do the same work.
pub(crate) const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hashes a password with Argon2id and a fresh random salt, returning a PHC string.
pub fn hash_password(password: &str) -> AuthResult<String> {
    let mut salt_bytes = [0u8; SALT_LEN];
    OsRng.try_fill_bytes(&mut salt_bytes).map_err(|e| {
        error!(error = %e, "Entropy source failed while generating salt");
        AuthError::HashingFailure
    })?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|_| AuthError::HashingFailure)?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "Argon2 rejected password input");
            AuthError::HashingFailure
        })
}

/// Checks a password against a stored PHC hash.
///
/// A wrong password, an unparseable hash and an unsupported algorithm all
/// return [`AuthError::InvalidCredentials`].
pub fn verify_password(password: &str, hash: &str) -> AuthResult<()> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        debug!(error = %e, "Stored password hash could not be parsed");
        AuthError::InvalidCredentials
    })?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}
