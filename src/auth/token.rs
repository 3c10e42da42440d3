use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{
    errors::{AuthError, AuthResult},
    types::{AccessClaims, UserId},
};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Issues and verifies stateless HS256 access tokens.
///
/// The signing secret is fixed at construction and never re-read.
#[derive(Clone)]
pub struct AccessTokenIssuer {
    secret: String,
    issuer: String,
    pub default_ttl: Duration,
}

impl AccessTokenIssuer {
    pub fn new(secret: impl Into<String>, issuer: impl Into<String>, default_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            default_ttl,
        }
    }

    /// Creates an access token for `user_id` with the default lifetime
    pub fn issue(&self, user_id: UserId) -> AuthResult<String> {
        self.issue_with_ttl(user_id, self.default_ttl)
    }

    /// Creates an access token for `user_id` expiring `ttl` from now.
    /// A negative `ttl` yields an already-expired token.
    #[instrument(skip(self))]
    pub fn issue_with_ttl(&self, user_id: UserId, ttl: Duration) -> AuthResult<String> {
        if self.secret.is_empty() {
            debug!("Refusing to sign access token with an empty secret");
            return Err(AuthError::SigningFailure);
        }

        let now = Utc::now();
        let exp = now.checked_add_signed(ttl).ok_or_else(|| {
            debug!("Access token expiry out of range");
            AuthError::SigningFailure
        })?;
        let claims = AccessClaims {
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        debug!(exp_timestamp = claims.exp, "Signing access token");

        encode(
            &Header::new(ALGORITHM),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode access token");
            AuthError::SigningFailure
        })
    }

    /// Verifies signature, algorithm, issuer and expiry, returning the subject.
    #[instrument(skip(self, token))]
    pub fn verify(&self, token: &str) -> AuthResult<UserId> {
        // Anyone can produce an HMAC under the empty key.
        if self.secret.is_empty() {
            debug!("Refusing to verify access token against an empty secret");
            return Err(AuthError::SignatureInvalid);
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data = decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to decode access token");
            map_jwt_error(e.kind())
        })?;

        // jsonwebtoken accepts exp == now; the token is only valid strictly before exp.
        if Utc::now().timestamp() >= data.claims.exp {
            return Err(AuthError::TokenExpired);
        }

        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| {
            debug!("Access token subject is not a UUID");
            AuthError::SubjectInvalid
        })?;

        debug!(user_id = %user_id, "Access token verified");
        Ok(user_id)
    }
}

fn map_jwt_error(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::SignatureInvalid,
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        ErrorKind::InvalidSubject => AuthError::SubjectInvalid,
        _ => AuthError::MalformedToken,
    }
}
