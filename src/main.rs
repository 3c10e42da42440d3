use chirpy::{
    build_router,
    chirp::{ChirpRepository, InMemoryChirpRepository, PostgresChirpRepository},
    config::AuthConfig,
    refresh::{InMemoryRefreshTokenRepository, PostgresRefreshTokenRepository, RefreshTokenRepository},
    user::{InMemoryUserRepository, PostgresUserRepository, UserRepository},
    AppState,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Repositories = (
    Arc<dyn UserRepository + Send + Sync>,
    Arc<dyn RefreshTokenRepository + Send + Sync>,
    Arc<dyn ChirpRepository + Send + Sync>,
);

#[tokio::main]
async fn main() {
    // Missing .env is fine; variables may come from the environment directly
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chirpy=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting chirpy server");

    let config = match AuthConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let (user_repository, refresh_repository, chirp_repository) = match repositories().await {
        Ok(repos) => repos,
        Err(e) => {
            error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        }
    };

    let app = build_router(AppState::new(
        &config,
        user_repository,
        refresh_repository,
        chirp_repository,
    ));

    let listener = match tokio::net::TcpListener::bind("0.0.0.0:8080").await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, "Failed to bind listener");
            std::process::exit(1);
        }
    };
    info!("Server running on http://localhost:8080");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server terminated");
    }
}

/// Postgres when DATABASE_URL is set, otherwise in-memory repositories
async fn repositories() -> Result<Repositories, sqlx::Error> {
    match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = sqlx::PgPool::connect(&database_url).await?;
            info!("Using PostgreSQL repositories");
            Ok((
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresRefreshTokenRepository::new(pool.clone())),
                Arc::new(PostgresChirpRepository::new(pool)),
            ))
        }
        Err(_) => {
            warn!("DATABASE_URL not set, using in-memory repositories");
            Ok((
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryRefreshTokenRepository::new()),
                Arc::new(InMemoryChirpRepository::new()),
            ))
        }
    }
}
