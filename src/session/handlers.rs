use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use tracing::{debug, info, instrument};

use super::types::{
    AccessTokenResponse, CredentialsRequest, LoginResponse, UserResponse, WebhookRequest,
};
use crate::{
    auth::{extract_bearer_token, AuthContext},
    shared::{AppError, AppState},
};

const USER_UPGRADED_EVENT: &str = "user.upgraded";

/// POST /api/users
#[instrument(name = "register", skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LoginResponse>), AppError> {
    let Json(request) = payload?;
    let response = state
        .session_service
        .register(&request.email, &request.password)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/login
#[instrument(name = "login", skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(request) = payload?;
    let response = state
        .session_service
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(response))
}

/// POST /api/refresh
/// Expects the refresh token as `Authorization: Bearer <refresh token>`
#[instrument(name = "refresh", skip(state, headers))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AccessTokenResponse>, AppError> {
    let refresh_token = extract_bearer_token(&headers)?;
    let token = state.session_service.refresh(refresh_token).await?;
    Ok(Json(AccessTokenResponse { token }))
}

/// POST /api/revoke
#[instrument(name = "revoke", skip(state, headers))]
pub async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let refresh_token = extract_bearer_token(&headers)?;
    state.session_service.revoke_session(refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/users (behind `jwt_auth`)
#[instrument(name = "change_password", skip(state, context, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let Json(request) = payload?;
    let user = state
        .session_service
        .change_password(&context, &request.password)
        .await?;
    Ok(Json(UserResponse::from(&user)))
}

/// POST /api/polka/webhooks (behind `require_api_key`)
#[instrument(name = "polka_webhook", skip(state, payload))]
pub async fn polka_webhook(
    State(state): State<AppState>,
    payload: Result<Json<WebhookRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(request) = payload?;
    if request.event != USER_UPGRADED_EVENT {
        debug!(event = %request.event, "Ignoring webhook event");
        return Ok(StatusCode::NO_CONTENT);
    }

    state
        .user_repository
        .upgrade_user(request.data.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    info!(user_id = %request.data.user_id, "User upgraded");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::build_router;
    use crate::shared::test_utils::{AppStateBuilder, TEST_API_KEY};
    use crate::user::{InMemoryUserRepository, UserRepository};
    use axum::{
        body::Body,
        http::{header::AUTHORIZATION, header::CONTENT_TYPE, Request},
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn credentials(email: &str, password: &str) -> Value {
        json!({ "email": email, "password": password })
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let app = build_router(AppStateBuilder::new().build());

        let (status, registered) = send(
            &app,
            "POST",
            "/api/users",
            None,
            Some(credentials("walt@breakingbad.com", "p1")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(registered["email"], "walt@breakingbad.com");
        assert!(registered["token"].as_str().unwrap().contains('.'));
        assert_eq!(registered["refresh_token"].as_str().unwrap().len(), 64);
        assert!(registered.get("hashed_password").is_none());

        let (status, login) = send(
            &app,
            "POST",
            "/api/login",
            None,
            Some(credentials("walt@breakingbad.com", "p1")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(login["id"], registered["id"]);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let app = build_router(AppStateBuilder::new().build());
        send(
            &app,
            "POST",
            "/api/users",
            None,
            Some(credentials("walt@breakingbad.com", "p1")),
        )
        .await;

        let wrong_password = send(
            &app,
            "POST",
            "/api/login",
            None,
            Some(credentials("walt@breakingbad.com", "p2")),
        )
        .await;
        let unknown_email = send(
            &app,
            "POST",
            "/api/login",
            None,
            Some(credentials("jesse@breakingbad.com", "p1")),
        )
        .await;

        assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password, unknown_email);
    }

    #[tokio::test]
    async fn test_refresh_and_revoke() {
        let app = build_router(AppStateBuilder::new().build());
        let (_, registered) = send(
            &app,
            "POST",
            "/api/users",
            None,
            Some(credentials("walt@breakingbad.com", "p1")),
        )
        .await;
        let refresh_header = format!("Bearer {}", registered["refresh_token"].as_str().unwrap());

        let (status, refreshed) = send(&app, "POST", "/api/refresh", Some(&refresh_header), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(refreshed["token"].as_str().unwrap().contains('.'));

        let (status, _) = send(&app, "POST", "/api/revoke", Some(&refresh_header), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, "POST", "/api/refresh", Some(&refresh_header), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");

        // Second revoke is indistinguishable from the first
        let (status, _) = send(&app, "POST", "/api/revoke", Some(&refresh_header), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_refresh_without_header() {
        let app = build_router(AppStateBuilder::new().build());

        for authorization in [None, Some("Bearer")] {
            let (status, body) = send(&app, "POST", "/api/refresh", authorization, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["error"], "Unauthorized");
        }
    }

    #[tokio::test]
    async fn test_change_password_requires_access_token() {
        let app = build_router(AppStateBuilder::new().build());
        let (_, registered) = send(
            &app,
            "POST",
            "/api/users",
            None,
            Some(credentials("walt@breakingbad.com", "p1")),
        )
        .await;

        let (status, _) = send(
            &app,
            "PUT",
            "/api/users",
            None,
            Some(credentials("walt@breakingbad.com", "p2")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // A refresh token is not an access token
        let refresh_header = format!("Bearer {}", registered["refresh_token"].as_str().unwrap());
        let (status, _) = send(
            &app,
            "PUT",
            "/api/users",
            Some(&refresh_header),
            Some(credentials("walt@breakingbad.com", "p2")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let access_header = format!("Bearer {}", registered["token"].as_str().unwrap());
        let (status, body) = send(
            &app,
            "PUT",
            "/api/users",
            Some(&access_header),
            Some(credentials("walt@breakingbad.com", "p2")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], registered["id"]);

        let (status, _) = send(
            &app,
            "POST",
            "/api/login",
            None,
            Some(credentials("walt@breakingbad.com", "p2")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_polka_webhook() {
        let users = Arc::new(InMemoryUserRepository::new());
        let app = build_router(
            AppStateBuilder::new()
                .with_user_repository(users.clone())
                .build(),
        );
        let (_, registered) = send(
            &app,
            "POST",
            "/api/users",
            None,
            Some(credentials("walt@breakingbad.com", "p1")),
        )
        .await;
        let user_id = registered["id"].as_str().unwrap().to_string();
        let api_key_header = format!("ApiKey {}", TEST_API_KEY);
        let upgrade = json!({ "event": "user.upgraded", "data": { "user_id": user_id } });

        let (status, _) = send(&app, "POST", "/api/polka/webhooks", None, Some(upgrade.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            "POST",
            "/api/polka/webhooks",
            Some("ApiKey wrong-key"),
            Some(upgrade.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let ignored = json!({ "event": "user.payment_failed", "data": { "user_id": user_id } });
        let (status, _) = send(&app, "POST", "/api/polka/webhooks", Some(&api_key_header), Some(ignored)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let stored = users
            .find_by_email("walt@breakingbad.com")
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.is_chirpy_red);

        let (status, _) = send(&app, "POST", "/api/polka/webhooks", Some(&api_key_header), Some(upgrade)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let stored = users
            .find_by_email("walt@breakingbad.com")
            .await
            .unwrap()
            .unwrap();
        assert!(stored.is_chirpy_red);

        let unknown = json!({
            "event": "user.upgraded",
            "data": { "user_id": "3311741c-680c-4546-99f3-fc9efac2036c" }
        });
        let (status, _) = send(&app, "POST", "/api/polka/webhooks", Some(&api_key_header), Some(unknown)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_bad_request() {
        let app = build_router(AppStateBuilder::new().build());

        for (content_type, body) in [
            (Some("application/json"), "{\"email\": "),
            (Some("application/json"), "{\"email\": \"walt@breakingbad.com\"}"),
            (None, "{\"email\": \"walt@breakingbad.com\", \"password\": \"p1\"}"),
        ] {
            let mut builder = Request::builder().method("POST").uri("/api/login");
            if let Some(value) = content_type {
                builder = builder.header(CONTENT_TYPE, value);
            }
            let response = app
                .clone()
                .oneshot(builder.body(Body::from(body)).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value: Value = serde_json::from_slice(&bytes).unwrap();
            assert!(value["error"].is_string());
        }
    }
}
