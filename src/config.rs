//! Authentication configuration.
//!
//! Read once at startup; the resulting values are immutable for the process lifetime.

use chrono::Duration;
use std::collections::HashMap;
use thiserror::Error;

pub const DEFAULT_ISSUER: &str = "chirpy";
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 3600;
pub const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 60;
pub const MAX_ACCESS_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;
pub const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 10 * 365;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be an integer between 1 and {max}: {value}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        max: i64,
    },
}

/// Settings for token issuance and trusted-service access
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AuthConfig {
    /// Config with default lifetimes and no API key
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            issuer: DEFAULT_ISSUER.to_string(),
            access_token_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_token_ttl: Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS),
            api_key: None,
        }
    }

    /// Loads configuration from environment variables
    ///
    /// * `JWT_SECRET` - required
    /// * `JWT_ISSUER` - defaults to `chirpy`
    /// * `ACCESS_TOKEN_TTL_SECS` - defaults to 3600
    /// * `REFRESH_TOKEN_TTL_DAYS` - defaults to 60
    /// * `POLKA_KEY` - optional
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let mut config = Self::new(jwt_secret);

        if let Some(issuer) = get("JWT_ISSUER") {
            config.issuer = issuer.to_string();
        }
        if let Some(value) = get("ACCESS_TOKEN_TTL_SECS") {
            config.access_token_ttl = parse_ttl(
                "ACCESS_TOKEN_TTL_SECS",
                value,
                MAX_ACCESS_TOKEN_TTL_SECS,
                Duration::try_seconds,
            )?;
        }
        if let Some(value) = get("REFRESH_TOKEN_TTL_DAYS") {
            config.refresh_token_ttl = parse_ttl(
                "REFRESH_TOKEN_TTL_DAYS",
                value,
                MAX_REFRESH_TOKEN_TTL_DAYS,
                Duration::try_days,
            )?;
        }
        config.api_key = get("POLKA_KEY").map(str::to_string);

        Ok(config)
    }
}

/// Parses a lifetime in `1..=max` units and converts it with `to_duration`
fn parse_ttl(
    name: &'static str,
    value: &str,
    max: i64,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError> {
    value
        .parse::<i64>()
        .ok()
        .filter(|n| (1..=max).contains(n))
        .and_then(to_duration)
        .ok_or_else(|| ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
            max,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::from_vars(&vars(&[("JWT_SECRET", "s3cret")])).unwrap();

        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.issuer, "chirpy");
        assert_eq!(config.access_token_ttl, Duration::hours(1));
        assert_eq!(config.refresh_token_ttl, Duration::days(60));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AuthConfig::from_vars(&vars(&[
            ("JWT_SECRET", "s3cret"),
            ("JWT_ISSUER", "chirpy-staging"),
            ("ACCESS_TOKEN_TTL_SECS", "900"),
            ("REFRESH_TOKEN_TTL_DAYS", "7"),
            ("POLKA_KEY", "f271c81ff7084ee5b99a5091b42d486e"),
        ]))
        .unwrap();

        assert_eq!(config.issuer, "chirpy-staging");
        assert_eq!(config.access_token_ttl, Duration::minutes(15));
        assert_eq!(config.refresh_token_ttl, Duration::days(7));
        assert_eq!(
            config.api_key.as_deref(),
            Some("f271c81ff7084ee5b99a5091b42d486e")
        );
    }

    #[rstest]
    #[case(&[])]
    #[case(&[("JWT_SECRET", "")])]
    #[case(&[("JWT_SECRET", "   ")])]
    fn test_missing_secret(#[case] pairs: &[(&str, &str)]) {
        assert_eq!(
            AuthConfig::from_vars(&vars(pairs)).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
    }

    #[rstest]
    #[case("ACCESS_TOKEN_TTL_SECS", "abc")]
    #[case("ACCESS_TOKEN_TTL_SECS", "0")]
    #[case("REFRESH_TOKEN_TTL_DAYS", "-3")]
    #[case("ACCESS_TOKEN_TTL_SECS", "1000000000000000")]
    #[case("ACCESS_TOKEN_TTL_SECS", "2592001")]
    #[case("REFRESH_TOKEN_TTL_DAYS", "3651")]
    #[case("REFRESH_TOKEN_TTL_DAYS", "9223372036854775807")]
    fn test_invalid_numbers(#[case] name: &str, #[case] value: &str) {
        let result = AuthConfig::from_vars(&vars(&[("JWT_SECRET", "s3cret"), (name, value)]));
        assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));
    }

    #[test]
    fn test_upper_bounds_accepted_and_usable() {
        let config = AuthConfig::from_vars(&vars(&[
            ("JWT_SECRET", "s3cret"),
            ("ACCESS_TOKEN_TTL_SECS", "2592000"),
            ("REFRESH_TOKEN_TTL_DAYS", "3650"),
        ]))
        .unwrap();

        assert_eq!(config.access_token_ttl, Duration::days(30));
        assert_eq!(config.refresh_token_ttl, Duration::days(3650));

        let issuer = crate::auth::AccessTokenIssuer::new(
            config.jwt_secret.clone(),
            config.issuer.clone(),
            config.access_token_ttl,
        );
        let user_id = uuid::Uuid::new_v4();
        let token = issuer.issue(user_id).unwrap();
        assert_eq!(issuer.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = AuthConfig::new("s3cret");
        config.api_key = Some("polka".to_string());
        let printed = format!("{:?}", config);

        assert!(!printed.contains("s3cret"));
        assert!(!printed.contains("polka"));
    }
}
