//! `/api/auth`: login and the authenticated user's own record.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::info;

use crate::api::error::{ApiError, FieldError, JsonBody};
use crate::api::{AppState, TokenResponse};
use crate::auth::{AuthUser, password};
use crate::db::UserProfile;
use crate::types::Email;

/// Same answer for unknown email and wrong password.
const INVALID_CREDENTIALS: &str = "Invalid Credentials";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if !Email::normalize(&self.email).is_valid() {
            errors.push(FieldError::field("email", "Please include a valid email"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::field("password", "Password is required"));
        }
        errors
    }
}

/// `POST /api/auth`
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let errors = req.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let email = Email::normalize(&req.email);
    let Some(user) = state.users.find_by_email(&email).await? else {
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.to_string()));
    };

    if !password::verify_password_blocking(req.password, user.password).await? {
        info!(user_id = %user.uid, "Login rejected: wrong password");
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.to_string()));
    }

    let token = state.issuer.issue(&user.uid)?;
    Ok(Json(TokenResponse { token }))
}

/// `GET /api/auth` (guarded)
pub async fn current_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    let record = state
        .users
        .get_user(user.id())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserProfile::from(record)))
}
