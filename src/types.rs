//! NewType wrappers for strong typing throughout the service.
//!
//! These types prevent accidental mixing of semantically different strings
//! (e.g., passing an email where a user ID is expected).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate a NewType wrapper with standard trait implementations.
macro_rules! newtype_string {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner String.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

newtype_string!(
    /// Stable identifier of a registered user.
    ///
    /// Assigned by the user store when the account is created and never
    /// changed afterwards. This is the identity carried inside access tokens.
    UserId
);

newtype_string!(
    /// Signed, time-limited bearer token handed to clients after
    /// registration or login.
    AccessToken
);

newtype_string!(
    /// Normalized (trimmed, lower-cased) email address.
    ///
    /// Emails are the login key, so every lookup goes through this type to
    /// keep comparisons case-insensitive.
    Email
);

impl Email {
    /// Normalize a raw email address as typed by the user.
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    /// Loose syntactic check: one `@`, a non-empty local part and a dotted
    /// domain without whitespace.
    pub fn is_valid(&self) -> bool {
        let Some((local, domain)) = self.0.split_once('@') else {
            return false;
        };
        if local.is_empty() || domain.contains('@') {
            return false;
        }
        if self.0.chars().any(char::is_whitespace) {
            return false;
        }
        match domain.rsplit_once('.') {
            Some((host, tld)) => !host.is_empty() && tld.len() >= 2,
            None => false,
        }
    }
}
