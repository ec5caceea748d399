//! Error responses for the REST API.

use std::fmt;

use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::auth::AuthError;

/// One entry of a `{"errors": [...]}` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    pub msg: String,
}

impl FieldError {
    pub fn field(param: &str, msg: &str) -> Self {
        Self {
            param: Some(param.to_string()),
            msg: msg.to_string(),
        }
    }

    pub fn general(msg: &str) -> Self {
        Self {
            param: None,
            msg: msg.to_string(),
        }
    }
}

/// JSON request body whose rejections render as [`ApiError`] instead of
/// axum's plain-text responses.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Errors returned by route handlers. Each variant renders exactly one
/// response.
#[derive(Debug)]
pub enum ApiError {
    /// Request body failed validation
    Validation(Vec<FieldError>),
    /// Request was well-formed but cannot be honoured
    BadRequest(String),
    /// Referenced entity does not exist
    NotFound(String),
    /// Token missing, invalid or unsignable
    Auth(AuthError),
    /// Anything unexpected (database, hashing)
    Internal(anyhow::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "Validation failed ({} errors)", errors.len()),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::Auth(err) => write!(f, "{}", err),
            Self::Internal(err) => write!(f, "Internal error: {}", err),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "errors": errors })))
                    .into_response()
            }
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "errors": [FieldError::general(&msg)] })),
            )
                .into_response(),
            Self::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(serde_json::json!({ "msg": msg }))).into_response()
            }
            Self::Auth(err) => err.into_response(),
            Self::Internal(err) => {
                tracing::error!("Request failed: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "msg": "Server Error" })),
                )
                    .into_response()
            }
        }
    }
}
