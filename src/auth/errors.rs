use thiserror::Error;

/// Internal authentication failures.
///
/// These keep the exact reason a credential was rejected so it can be logged.
/// They must be collapsed into [`crate::shared::AppError`] before reaching a client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Incorrect credentials")]
    InvalidCredentials,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Token signature is invalid")]
    SignatureInvalid,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token subject is not a valid identity")]
    SubjectInvalid,

    #[error("Token issuer does not match")]
    InvalidIssuer,

    #[error("Authorization header is missing")]
    MissingHeader,

    #[error("Authorization header is malformed")]
    MalformedHeader,

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Entropy source unavailable")]
    EntropyFailure,

    #[error("Password hashing failed")]
    HashingFailure,

    #[error("Token signing failed")]
    SigningFailure,

    #[error("Email already registered")]
    EmailTaken,
}

impl AuthError {
    /// True for conditions caused by the server rather than the client.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            AuthError::StorageFailure(_)
                | AuthError::EntropyFailure
                | AuthError::HashingFailure
                | AuthError::SigningFailure
        )
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::StorageFailure(e.to_string())
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
