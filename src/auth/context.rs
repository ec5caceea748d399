//! Request-scoped identity attached by the guard.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::error::AuthError;
use crate::types::UserId;

/// Identity of the caller of a guarded request.
///
/// Created by [`require_auth`](crate::auth::require_auth) after the token
/// has been verified and stored in the request extensions. It lives only as
/// long as the request and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    id: UserId,
    /// Expiry of the token that authenticated this request (Unix seconds)
    expires_at: i64,
}

impl AuthUser {
    pub fn new(id: UserId, expires_at: i64) -> Self {
        Self { id, expires_at }
    }

    /// Identity carried by the token.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// When the presented token stops being accepted.
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }
}

/// Handlers take `AuthUser` as an argument to read the identity. A route
/// that is not behind the guard has no identity and is rejected as if the
/// token were missing.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}
