//! Token verification and the axum middleware built on it.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use crate::auth::clock::Clock;
use crate::auth::context::AuthUser;
use crate::auth::error::AuthError;
use crate::auth::issuer::Claims;
use crate::auth::secret::CredentialSecret;

/// Request header carrying the bare access token.
pub const TOKEN_HEADER: &str = "x-auth-token";

/// Verifies access tokens against the shared secret.
pub struct AccessGuard {
    key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl AccessGuard {
    /// Create a guard checking signatures with `secret` and expiry with `clock`.
    pub fn new(secret: CredentialSecret, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against our own clock below.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: secret.decoding_key(),
            validation,
            clock,
        }
    }

    /// Verify `token` and return the identity it carries.
    pub fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(format!("{:?}", e.kind())))?;
        let claims = data.claims;

        let now = self.clock.now();
        if now >= claims.exp {
            return Err(AuthError::InvalidToken(format!(
                "expired at {} (now {})",
                claims.exp, now
            )));
        }

        if claims.user.id.as_str().is_empty() {
            return Err(AuthError::InvalidToken("empty user id".to_string()));
        }

        Ok(AuthUser::new(claims.user.id, claims.exp))
    }

    /// Extract and verify the token from a raw header value.
    ///
    /// `None` and the empty string both count as "no token".
    pub fn authenticate(&self, header: Option<&[u8]>) -> Result<AuthUser, AuthError> {
        let raw = match header {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Err(AuthError::MissingToken),
        };
        let token = std::str::from_utf8(raw)
            .map_err(|_| AuthError::InvalidToken("header is not valid UTF-8".to_string()))?;
        self.verify(token)
    }
}

/// Middleware admitting only requests with a valid `x-auth-token`.
///
/// ```ignore
/// Router::new()
///     .route("/api/auth", get(current_user))
///     .route_layer(axum::middleware::from_fn_with_state(guard, require_auth));
/// ```
pub async fn require_auth(
    State(guard): State<Arc<AccessGuard>>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(TOKEN_HEADER)
        .map(|value| value.as_bytes());

    match guard.authenticate(header) {
        Ok(user) => {
            debug!(user_id = %user.id(), path = %request.uri().path(), "Request authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => {
            debug!(path = %request.uri().path(), "Request rejected: {}", err);
            err.into_response()
        }
    }
}
