//! Test setup infrastructure - wires a session service over in-memory stores
#![allow(dead_code)] // Test utilities may not all be used in every test

use std::sync::Arc;

use axum::Router;
use chrono::Duration;

use chirpy::{
    build_router, AppState, AuthConfig, InMemoryChirpRepository, InMemoryRefreshTokenRepository,
    InMemoryUserRepository, SessionService,
};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_API_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub config: AuthConfig,
    pub users: Arc<InMemoryUserRepository>,
    pub refresh_tokens: Arc<InMemoryRefreshTokenRepository>,
    pub chirps: Arc<InMemoryChirpRepository>,
    pub service: SessionService,
    pub app: Router,
}

pub struct TestSetupBuilder {
    config: AuthConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        let mut config = AuthConfig::new(TEST_SECRET);
        config.api_key = Some(TEST_API_KEY.to_string());
        Self { config }
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.config.access_token_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.config.refresh_token_ttl = ttl;
        self
    }

    pub fn build(self) -> TestSetup {
        let users = Arc::new(InMemoryUserRepository::new());
        let refresh_tokens = Arc::new(InMemoryRefreshTokenRepository::new());
        let chirps = Arc::new(InMemoryChirpRepository::new());

        let service = SessionService::new(&self.config, users.clone(), refresh_tokens.clone());
        let app = build_router(AppState::new(
            &self.config,
            users.clone(),
            refresh_tokens.clone(),
            chirps.clone(),
        ));

        TestSetup {
            config: self.config,
            users,
            refresh_tokens,
            chirps,
            service,
            app,
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}
