use axum::http::{header::AUTHORIZATION, HeaderMap};

use super::errors::{AuthError, AuthResult};

const BEARER_SCHEME: &str = "Bearer";
const API_KEY_SCHEME: &str = "ApiKey";

/// Returns the token from `Authorization: Bearer <token>`.
pub fn extract_bearer_token(headers: &HeaderMap) -> AuthResult<&str> {
    extract_credential(headers, BEARER_SCHEME)
}

/// Returns the key from `Authorization: ApiKey <key>`.
pub fn extract_api_key(headers: &HeaderMap) -> AuthResult<&str> {
    extract_credential(headers, API_KEY_SCHEME)
}

fn extract_credential<'a>(headers: &'a HeaderMap, scheme: &str) -> AuthResult<&'a str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?
        .trim();

    if value.is_empty() {
        return Err(AuthError::MissingHeader);
    }

    // Scheme word, at least one space, then a non-empty credential with no further spaces
    let rest = value
        .strip_prefix(scheme)
        .ok_or(AuthError::MalformedHeader)?;
    if !rest.starts_with(' ') {
        return Err(AuthError::MalformedHeader);
    }

    let credential = rest.trim_start();
    if credential.is_empty() || credential.contains(char::is_whitespace) {
        return Err(AuthError::MalformedHeader);
    }

    Ok(credential)
}
