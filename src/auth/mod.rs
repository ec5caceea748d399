//! Authentication and credential issuance.
//!
//! Two halves share one symmetric [`CredentialSecret`]:
//!
//! - **Issuer**: signs an HS256 access token for a user identity after a
//!   successful registration or login.
//! - **Guard**: axum middleware that reads the `x-auth-token` header,
//!   verifies the token and places an [`AuthUser`] into the request
//!   extensions for downstream handlers.
//!
//! ## Security Model
//!
//! - Tokens are self-contained and expire a fixed time after issuance
//! - There is no server-side revocation list
//! - Passwords are stored only as argon2 hashes
//! - The secret is loaded once at startup and never leaves the process
//!
//! ## Usage
//!
//! ```ignore
//! let secret = CredentialSecret::new(config_value)?;
//! let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//! let issuer = CredentialIssuer::new(secret.clone(), ttl, clock.clone());
//! let guard = AccessGuard::new(secret, clock);
//!
//! let token = issuer.issue(&user_id)?;
//! let user = guard.verify(token.as_str())?;
//! ```

mod clock;
mod context;
mod error;
mod guard;
mod issuer;
pub mod password;
mod secret;
mod user_store;

pub use clock::{Clock, SystemClock};
#[cfg(test)]
pub(crate) use clock::ManualClock;
pub use context::AuthUser;
pub use error::AuthError;
pub use guard::{AccessGuard, TOKEN_HEADER, require_auth};
pub use issuer::{Claims, ClaimsUser, CredentialIssuer, DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS};
pub use secret::CredentialSecret;
pub use user_store::{CreateOutcome, NewUser, UserStore, gravatar_url};
