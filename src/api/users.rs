//! `POST /api/users`: registration.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::api::error::{ApiError, FieldError, JsonBody};
use crate::api::{AppState, TokenResponse};
use crate::auth::{CreateOutcome, NewUser, password};
use crate::types::Email;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Collect every validation failure rather than stopping at the first.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::field("name", "Name is required"));
        }
        if !Email::normalize(&self.email).is_valid() {
            errors.push(FieldError::field("email", "Please include a valid email"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::field(
                "password",
                "Please enter a password with 6 or more characters",
            ));
        }
        errors
    }
}

fn already_exists() -> ApiError {
    ApiError::BadRequest("User already exists".to_string())
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let errors = req.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let email = Email::normalize(&req.email);
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(already_exists());
    }

    let password_hash = password::hash_password_blocking(req.password).await?;
    let outcome = state
        .users
        .create_user(NewUser {
            name: req.name.trim().to_string(),
            email,
            password_hash,
        })
        .await?;
    let CreateOutcome::Created(user) = outcome else {
        return Err(already_exists());
    };

    let token = state.issuer.issue(&user.uid)?;
    Ok(Json(TokenResponse { token }))
}
