//! Authentication errors and their HTTP rendering.

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Body text for requests without a token.
pub const MISSING_TOKEN_MSG: &str = "No token, authorization denied";
/// Body text for tokens that fail verification for any reason.
pub const INVALID_TOKEN_MSG: &str = "Token is invalid";

/// Errors produced by the issuer and the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `x-auth-token` header (or an empty one) on the request
    MissingToken,
    /// Malformed, wrongly signed or expired token. The payload is the
    /// internal reason, logged but never sent to the client.
    InvalidToken(String),
    /// The token could not be signed
    SigningFailed(String),
}

impl AuthError {
    /// HTTP status used when this error terminates a request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::SigningFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingToken => MISSING_TOKEN_MSG,
            Self::InvalidToken(_) => INVALID_TOKEN_MSG,
            Self::SigningFailed(_) => "Server Error",
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingToken => write!(f, "{}", MISSING_TOKEN_MSG),
            Self::InvalidToken(reason) => write!(f, "{}: {}", INVALID_TOKEN_MSG, reason),
            Self::SigningFailed(reason) => write!(f, "Token signing failed: {}", reason),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Self::SigningFailed(reason) = &self {
            tracing::error!("Token signing failed: {}", reason);
        }
        let body = serde_json::json!({ "msg": self.public_message() });
        (self.status_code(), Json(body)).into_response()
    }
}
