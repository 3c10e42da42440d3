use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{info, instrument, warn};

use crate::shared::{AppError, AppState};

/// JWT authentication middleware - validates Authorization Bearer header and adds AuthContext to request.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), auth::jwt_auth))
/// Handlers can then extract Extension(context): Extension<AuthContext>.
#[instrument(skip(state, req, next), fields(path = %req.uri().path()))]
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let action = format!("{} {}", req.method(), req.uri().path());
    let context = state
        .session_service
        .authorize_headers(req.headers(), &action)?;

    info!(user_id = %context.user_id, "Authentication successful, adding context to request");

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

/// Trusted-service middleware - requires `Authorization: ApiKey <key>` matching the configured key.
#[instrument(skip(state, req, next), fields(path = %req.uri().path()))]
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Err(e) = state.api_key_guard.verify(req.headers()) {
        warn!(error = %e, "API key rejected");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthContext;
    use crate::shared::test_utils::{AppStateBuilder, TEST_API_KEY};
    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Extension, Router,
    };
    use chrono::Duration;
    use tower::ServiceExt; // for `oneshot`
    use uuid::Uuid;

    async fn whoami(Extension(context): Extension<AuthContext>) -> String {
        context.user_id.to_string()
    }

    fn protected_app(state: AppState) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(state.clone(), jwt_auth))
            .with_state(state)
    }

    fn service_app(state: AppState) -> Router {
        Router::new()
            .route("/hook", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
            .with_state(state)
    }

    fn request(uri: &str, authorization: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_jwt_auth_inserts_context() {
        let state = AppStateBuilder::new().build();
        let user_id = Uuid::new_v4();
        let token = state.session_service.access_tokens().issue(user_id).unwrap();

        let response = protected_app(state)
            .oneshot(request("/whoami", Some(&format!("Bearer {}", token))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, user_id.to_string());
    }

    #[tokio::test]
    async fn test_jwt_auth_rejects() {
        let state = AppStateBuilder::new().build();
        let expired = state
            .session_service
            .access_tokens()
            .issue_with_ttl(Uuid::new_v4(), Duration::hours(-1))
            .unwrap();
        let expired_header = format!("Bearer {}", expired);

        for authorization in [None, Some("Bearer"), Some("Bearer garbage"), Some(expired_header.as_str())] {
            let response = protected_app(state.clone())
                .oneshot(request("/whoami", authorization))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_require_api_key() {
        let state = AppStateBuilder::new().build();

        let accepted = service_app(state.clone())
            .oneshot(request("/hook", Some(&format!("ApiKey {}", TEST_API_KEY))))
            .await
            .unwrap();
        assert_eq!(accepted.status(), StatusCode::OK);

        for authorization in [None, Some("ApiKey wrong"), Some("ApiKey"), Some("Bearer token")] {
            let response = service_app(state.clone())
                .oneshot(request("/hook", authorization))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }
}
