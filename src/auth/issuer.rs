//! Access token issuance.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::clock::Clock;
use crate::auth::error::AuthError;
use crate::auth::secret::CredentialSecret;
use crate::types::{AccessToken, UserId};

/// Lifetime of an issued token in seconds (10 hours).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 10 * 60 * 60;

/// Longest lifetime a configuration may ask for (one year).
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Identity block inside the token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsUser {
    pub id: UserId,
}

/// Token payload: `{"user": {"id": ...}, "iat": ..., "exp": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user: ClaimsUser,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration time (Unix seconds)
    pub exp: i64,
}

/// Signs access tokens for known identities.
pub struct CredentialIssuer {
    key: EncodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CredentialIssuer {
    /// Create an issuer signing with `secret`, producing tokens valid for `ttl`.
    pub fn new(secret: CredentialSecret, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            key: secret.encoding_key(),
            ttl,
            clock,
        }
    }

    /// Token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user_id`.
    ///
    /// The caller is responsible for the identity being real; nothing is
    /// looked up here.
    pub fn issue(&self, user_id: &UserId) -> Result<AccessToken, AuthError> {
        let iat = self.clock.now();
        let exp = iat
            .checked_add(self.ttl.num_seconds())
            .ok_or_else(|| AuthError::SigningFailed("token expiry overflows".to_string()))?;
        let claims = Claims {
            user: ClaimsUser {
                id: user_id.clone(),
            },
            iat,
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AuthError::SigningFailed(e.to_string()))?;

        debug!(user_id = %user_id, exp = claims.exp, "Issued access token");
        Ok(AccessToken::new(token))
    }
}
