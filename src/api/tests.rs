//! Router-level tests: real router, in-memory database, manual clock.

#![cfg(test)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
    routing::get,
};
use chrono::Duration;
use serde_json::{Value, json};
use tower::ServiceExt;

use super::{AppState, create_router};
use crate::auth::{
    AccessGuard, AuthUser, CredentialIssuer, CredentialSecret, DEFAULT_TOKEN_TTL_SECS,
    ManualClock, TOKEN_HEADER, UserStore, require_auth,
};
use crate::db::{DatabaseConfig, create_connection, ensure_schema};
use crate::types::UserId;

const SECRET: &str = "router-test-secret";

async fn setup(clock: Arc<ManualClock>) -> AppState {
    let config = DatabaseConfig {
        url: "memory".to_string(),
        ..Default::default()
    };
    let db = create_connection(config).await.unwrap();
    ensure_schema(&db).await.unwrap();

    let secret = CredentialSecret::new(SECRET).unwrap();
    AppState {
        users: Arc::new(UserStore::new(db)),
        issuer: Arc::new(CredentialIssuer::new(
            secret.clone(),
            Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            clock.clone(),
        )),
        guard: Arc::new(AccessGuard::new(secret, clock)),
    }
}

fn now_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::at(chrono::Utc::now().timestamp()))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_token(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(TOKEN_HEADER, token);
    }
    builder.body(Body::empty()).unwrap()
}

async fn register(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/api/users",
            json!({ "name": "Jane Doe", "email": email, "password": password }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "registration failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

/// Router with a single guarded route that records whether it ran.
fn guarded_router(state: &AppState, reached: Arc<AtomicBool>) -> Router {
    Router::new()
        .route(
            "/whoami",
            get(move |user: AuthUser| {
                let reached = reached.clone();
                async move {
                    reached.store(true, Ordering::SeqCst);
                    user.id().to_string()
                }
            }),
        )
        .route_layer(middleware::from_fn_with_state(
            state.guard.clone(),
            require_auth,
        ))
}

#[tokio::test]
async fn test_index_and_health() {
    let app = create_router(setup(now_clock()).await);

    let (status, body) = send(&app, get_with_token("/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("API running".to_string()));

    let (status, body) = send(&app, get_with_token("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_token_is_rejected_before_handler() {
    let state = setup(now_clock()).await;
    let reached = Arc::new(AtomicBool::new(false));
    let app = guarded_router(&state, reached.clone());

    let (status, body) = send(&app, get_with_token("/whoami", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "msg": "No token, authorization denied" }));
    assert!(!reached.load(Ordering::SeqCst));

    let (status, body) = send(&app, get_with_token("/whoami", Some(""))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "msg": "No token, authorization denied" }));
    assert!(!reached.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_malformed_token_is_rejected() {
    let state = setup(now_clock()).await;
    let reached = Arc::new(AtomicBool::new(false));
    let app = guarded_router(&state, reached.clone());

    let (status, body) = send(&app, get_with_token("/whoami", Some("not-a-token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "msg": "Token is invalid" }));
    assert!(!reached.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_foreign_secret_is_rejected() {
    let clock = now_clock();
    let state = setup(clock.clone()).await;
    let reached = Arc::new(AtomicBool::new(false));
    let app = guarded_router(&state, reached.clone());

    let foreign = CredentialIssuer::new(
        CredentialSecret::new("not-the-server-secret").unwrap(),
        Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
        clock,
    );
    let token = foreign.issue(&UserId::new("u1")).unwrap();

    let (status, body) = send(&app, get_with_token("/whoami", Some(token.as_str()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "msg": "Token is invalid" }));
    assert!(!reached.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_valid_token_reaches_handler_with_identity() {
    let state = setup(now_clock()).await;
    let reached = Arc::new(AtomicBool::new(false));
    let app = guarded_router(&state, reached.clone());

    let token = state.issuer.issue(&UserId::new("u1")).unwrap();
    let (status, body) = send(&app, get_with_token("/whoami", Some(token.as_str()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("u1".to_string()));
    assert!(reached.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_token_expires_after_ttl() {
    let clock = now_clock();
    let state = setup(clock.clone()).await;
    let reached = Arc::new(AtomicBool::new(false));
    let app = guarded_router(&state, reached.clone());

    let token = state.issuer.issue(&UserId::new("u1")).unwrap();
    clock.advance(DEFAULT_TOKEN_TTL_SECS + 1);

    let (status, body) = send(&app, get_with_token("/whoami", Some(token.as_str()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "msg": "Token is invalid" }));
    assert!(!reached.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_register_then_fetch_current_user() {
    let clock = now_clock();
    let app = create_router(setup(clock.clone()).await);

    let token = register(&app, "Jane@Example.com", "secret1").await;

    let (status, body) = send(&app, get_with_token("/api/auth", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Jane Doe");
    assert_eq!(body["email"], "jane@example.com");
    assert!(body["avatar"].as_str().unwrap().contains("gravatar.com"));
    assert!(body.get("password").is_none());

    clock.advance(DEFAULT_TOKEN_TTL_SECS);
    let (status, body) = send(&app, get_with_token("/api/auth", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "msg": "Token is invalid" }));
}

#[tokio::test]
async fn test_current_user_requires_token() {
    let app = create_router(setup(now_clock()).await);

    let (status, body) = send(&app, get_with_token("/api/auth", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "msg": "No token, authorization denied" }));
}

#[tokio::test]
async fn test_current_user_deleted_after_issue() {
    let state = setup(now_clock()).await;
    let app = create_router(state.clone());

    let token = state.issuer.issue(&UserId::new("ghost")).unwrap();
    let (status, body) = send(&app, get_with_token("/api/auth", Some(token.as_str()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "msg": "User not found" }));
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = create_router(setup(now_clock()).await);

    let (status, body) = send(
        &app,
        post_json("/api/users", json!({ "email": "bad", "password": "123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let errors = body["errors"].as_array().unwrap();
    let params: Vec<&str> = errors.iter().map(|e| e["param"].as_str().unwrap()).collect();
    assert_eq!(params, ["name", "email", "password"]);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = create_router(setup(now_clock()).await);
    register(&app, "dup@example.com", "secret1").await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/users",
            json!({ "name": "Other", "email": "DUP@example.com", "password": "secret2" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": [{ "msg": "User already exists" }] }));
}

#[tokio::test]
async fn test_login() {
    let app = create_router(setup(now_clock()).await);
    let registered = register(&app, "login@example.com", "secret1").await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/auth",
            json!({ "email": "login@example.com", "password": "secret1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();

    // Both tokens identify the same user.
    let (_, me_registered) = send(&app, get_with_token("/api/auth", Some(&registered))).await;
    let (_, me_login) = send(&app, get_with_token("/api/auth", Some(token))).await;
    assert_eq!(me_registered["id"], me_login["id"]);
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let app = create_router(setup(now_clock()).await);
    register(&app, "who@example.com", "secret1").await;

    let expected = json!({ "errors": [{ "msg": "Invalid Credentials" }] });

    let (status, body) = send(
        &app,
        post_json(
            "/api/auth",
            json!({ "email": "who@example.com", "password": "wrong-one" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, expected);

    let (status, body) = send(
        &app,
        post_json(
            "/api/auth",
            json!({ "email": "nobody@example.com", "password": "secret1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, expected);
}

#[tokio::test]
async fn test_login_validation_errors() {
    let app = create_router(setup(now_clock()).await);

    let (status, body) = send(&app, post_json("/api/auth", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let params: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["param"].as_str().unwrap())
        .collect();
    assert_eq!(params, ["email", "password"]);
}

fn post_raw(uri: &str, content_type: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_unreadable_bodies_get_json_errors() {
    let app = create_router(setup(now_clock()).await);
    let json_type = Some("application/json");

    let cases = [
        ("/api/users", json_type, "{not json"),
        ("/api/users", None, r#"{"name":"Jane","email":"j@example.com","password":"secret"}"#),
        ("/api/users", json_type, r#"{"name":"Jane","email":5,"password":"secret"}"#),
        ("/api/auth", json_type, "{not json"),
        ("/api/auth", Some("text/plain"), r#"{"email":"j@example.com","password":"x"}"#),
        ("/api/auth", json_type, r#"{"email":["j@example.com"],"password":"x"}"#),
    ];

    for (uri, content_type, raw) in cases {
        let (status, body) = send(&app, post_raw(uri, content_type, raw)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {raw}: {body}");
        assert!(
            body["errors"][0]["msg"].is_string(),
            "{uri} {raw}: expected JSON errors body, got {body}"
        );
    }
}

#[tokio::test]
async fn test_auth_route_methods() {
    let app = create_router(setup(now_clock()).await);

    let request = Request::builder()
        .method("PUT")
        .uri("/api/auth")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    // Login stays public: no token, yet it reaches validation.
    let (status, body) = send(&app, post_json("/api/auth", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].is_array());

    let (status, _) = send(&app, get_with_token("/api/auth", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
