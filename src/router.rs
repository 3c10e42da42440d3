use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    auth::{jwt_auth, require_api_key},
    chirp::handlers as chirp_handlers,
    session::handlers,
    shared::AppState,
};

/// Builds the HTTP surface around the session subsystem
pub fn build_router(state: AppState) -> Router {
    let change_password = put(handlers::change_password)
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth));
    let create_chirp = post(chirp_handlers::create_chirp)
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth));
    let delete_chirp = delete(chirp_handlers::delete_chirp)
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth));
    let polka_webhook = post(handlers::polka_webhook)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/api/healthz", get(|| async { "OK" }))
        .route("/api/users", post(handlers::register).merge(change_password))
        .route("/api/login", post(handlers::login))
        .route("/api/refresh", post(handlers::refresh))
        .route("/api/revoke", post(handlers::revoke))
        .route("/api/chirps", get(chirp_handlers::list_chirps).merge(create_chirp))
        .route("/api/chirps/:chirp_id", get(chirp_handlers::get_chirp).merge(delete_chirp))
        .route("/api/polka/webhooks", polka_webhook)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
