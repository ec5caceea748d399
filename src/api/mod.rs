// REST API endpoints

mod auth;
pub mod error;
mod users;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
    Router, middleware,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{AccessGuard, CredentialIssuer, UserStore, require_auth};
use crate::types::AccessToken;

pub use error::{ApiError, FieldError, JsonBody};

/// Shared handles for every request. Everything inside is read-only or
/// internally synchronised, so no lock is needed.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserStore>,
    pub issuer: Arc<CredentialIssuer>,
    pub guard: Arc<AccessGuard>,
}

/// Body returned by registration and login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: AccessToken,
}

pub fn create_router(state: AppState) -> Router {
    // Only GET is guarded; other methods on the path still answer 405.
    let auth_route = get(auth::current_user)
        .route_layer(middleware::from_fn_with_state(
            state.guard.clone(),
            require_auth,
        ))
        .post(auth::login);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/users", post(users::register))
        .route("/api/auth", auth_route)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn index() -> &'static str {
    "API running"
}

async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
