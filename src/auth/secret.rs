//! Shared symmetric key used to sign and verify access tokens.

use std::fmt;
use std::sync::Arc;

use jsonwebtoken::{DecodingKey, EncodingKey};

/// Process-wide HMAC secret.
///
/// Built once from configuration at startup and shared read-only by the
/// issuer and the guard. Cloning is cheap. The value is redacted from
/// `Debug` output so it never ends up in logs.
#[derive(Clone)]
pub struct CredentialSecret(Arc<str>);

impl CredentialSecret {
    /// Wrap a configured secret, rejecting an empty or blank value.
    pub fn new(value: impl AsRef<str>) -> anyhow::Result<Self> {
        let value = value.as_ref();
        if value.trim().is_empty() {
            anyhow::bail!("credential secret must not be empty");
        }
        Ok(Self(Arc::from(value)))
    }

    pub(crate) fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.0.as_bytes())
    }

    pub(crate) fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.0.as_bytes())
    }
}

impl fmt::Debug for CredentialSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialSecret(<redacted>)")
    }
}
