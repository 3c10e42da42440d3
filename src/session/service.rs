use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::types::{LoginResponse, TokenPair};
use crate::{
    auth::{
        extract_bearer_token, hash_password, password::DUMMY_PASSWORD_HASH, verify_password,
        AccessTokenIssuer, AuthContext, AuthError, AuthResult, UserId,
    },
    config::AuthConfig,
    refresh::{RefreshTokenManager, RefreshTokenRepository},
    shared::AppError,
    user::{UserModel, UserRepository},
};

/// Composes password, access token and refresh token handling into the
/// login / refresh / revoke / authorize lifecycle.
///
/// Every error leaving this service is already collapsed to the coarse
/// client-facing outcomes of [`AppError`].
pub struct SessionService {
    users: Arc<dyn UserRepository + Send + Sync>,
    access_tokens: AccessTokenIssuer,
    refresh_tokens: RefreshTokenManager,
}

impl SessionService {
    pub fn new(
        config: &AuthConfig,
        users: Arc<dyn UserRepository + Send + Sync>,
        refresh_repository: Arc<dyn RefreshTokenRepository + Send + Sync>,
    ) -> Self {
        let access_tokens = AccessTokenIssuer::new(
            config.jwt_secret.clone(),
            config.issuer.clone(),
            config.access_token_ttl,
        );
        let refresh_tokens = RefreshTokenManager::new(refresh_repository, config.refresh_token_ttl);

        Self::with_components(users, access_tokens, refresh_tokens)
    }

    pub fn with_components(
        users: Arc<dyn UserRepository + Send + Sync>,
        access_tokens: AccessTokenIssuer,
        refresh_tokens: RefreshTokenManager,
    ) -> Self {
        Self {
            users,
            access_tokens,
            refresh_tokens,
        }
    }

    pub fn access_tokens(&self) -> &AccessTokenIssuer {
        &self.access_tokens
    }

    /// Creates an account and signs it straight in
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let email = email.trim();
        validate_email(email)?;
        validate_password(password)?;

        let hashed_password = hash_off_thread(password.to_string()).await?;
        let user = UserModel::new(email.to_string(), hashed_password);
        self.users.create_user(&user).await?;
        info!(user_id = %user.id, "User registered");

        let tokens = self.issue_tokens(user.id).await?;
        Ok(LoginResponse::new(&user, tokens))
    }

    /// Verifies email + password and issues a fresh token pair.
    ///
    /// An unknown email still runs a full hash verification so it cannot be
    /// told apart from a wrong password by outcome or timing.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let user = self.users.find_by_email(email.trim()).await?;

        let stored_hash = user
            .as_ref()
            .map(|u| u.hashed_password.clone())
            .unwrap_or_else(|| DUMMY_PASSWORD_HASH.to_string());
        let verified = verify_off_thread(password.to_string(), stored_hash).await;

        let user = match (user, verified) {
            (Some(user), Ok(())) => user,
            (_, Err(e)) if e.is_server_fault() => return Err(e.into()),
            _ => {
                warn!("Login rejected");
                return Err(AppError::InvalidCredentials);
            }
        };

        let tokens = self.issue_tokens(user.id).await?;
        info!(user_id = %user.id, "User logged in");
        Ok(LoginResponse::new(&user, tokens))
    }

    /// Mints a new access token from a usable refresh token.
    /// The refresh token itself is not rotated.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        let Some(record) = self.refresh_tokens.lookup(refresh_token).await? else {
            warn!("Refresh rejected: token unknown, expired or revoked");
            return Err(AppError::Unauthorized);
        };

        let access_token = self.access_tokens.issue(record.user_id)?;
        info!(user_id = %record.user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revokes a refresh token. Repeating the call for the same token succeeds again.
    #[instrument(skip(self, refresh_token))]
    pub async fn revoke_session(&self, refresh_token: &str) -> Result<(), AppError> {
        match self.refresh_tokens.revoke(refresh_token).await? {
            Some(record) => {
                info!(user_id = %record.user_id, "Session revoked");
                Ok(())
            }
            None => {
                warn!("Revoke rejected: token unknown");
                Err(AppError::Unauthorized)
            }
        }
    }

    /// Verifies an access token for `action` and returns the caller's identity.
    /// Ownership of the target resource is checked by the caller via [`AuthContext::owns`].
    #[instrument(skip(self, token))]
    pub fn authorize(&self, token: &str, action: &str) -> Result<AuthContext, AppError> {
        match self.access_tokens.verify(token) {
            Ok(user_id) => Ok(AuthContext::new(user_id, token.to_string())),
            Err(e) => {
                warn!(error = %e, "Access token rejected");
                Err(e.into())
            }
        }
    }

    /// Bearer extraction followed by [`Self::authorize`]
    pub fn authorize_headers(
        &self,
        headers: &HeaderMap,
        action: &str,
    ) -> Result<AuthContext, AppError> {
        let token = extract_bearer_token(headers).map_err(|e| {
            warn!(action = %action, error = %e, "No usable bearer token");
            AppError::from(e)
        })?;
        self.authorize(token, action)
    }

    /// Replaces the authenticated user's password hash
    #[instrument(skip(self, context, new_password), fields(user_id = %context.user_id))]
    pub async fn change_password(
        &self,
        context: &AuthContext,
        new_password: &str,
    ) -> Result<UserModel, AppError> {
        validate_password(new_password)?;

        let hashed_password = hash_off_thread(new_password.to_string()).await?;
        let user = self
            .users
            .update_password(context.user_id, &hashed_password)
            .await?
            .ok_or_else(|| {
                warn!("Token subject has no user record");
                AppError::Unauthorized
            })?;

        info!("Password changed");
        Ok(user)
    }

    async fn issue_tokens(&self, user_id: UserId) -> Result<TokenPair, AppError> {
        let token = self.access_tokens.issue(user_id)?;
        let refresh_token = self.refresh_tokens.issue(user_id).await?;
        Ok(TokenPair {
            token,
            refresh_token,
        })
    }
}

fn validate_email(email: &str) -> Result<(), AppError> {
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.is_empty() {
        return Err(AppError::BadRequest("Password must not be empty".to_string()));
    }
    Ok(())
}

// Argon2 is deliberately slow; keep it off the async worker threads.
async fn hash_off_thread(password: String) -> AuthResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|_| AuthError::HashingFailure)?
}

async fn verify_off_thread(password: String, hash: String) -> AuthResult<()> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|_| AuthError::HashingFailure)?
}
