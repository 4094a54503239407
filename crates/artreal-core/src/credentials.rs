//! API credentials.

use std::fmt;

/// Prefix every Google API key starts with.
const GOOGLE_KEY_PREFIX: &str = "AIza";

/// A bearer credential for the completion service.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key without validation (configured defaults).
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Accept a caller-supplied key only when it looks like a Google API key.
    ///
    /// Returns `None` for anything else so the caller falls back to the
    /// configured default.
    #[must_use]
    pub fn from_header(value: &str) -> Option<Self> {
        let value = value.trim();
        value
            .starts_with(GOOGLE_KEY_PREFIX)
            .then(|| Self(value.to_owned()))
    }

    /// The raw secret, for building an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
