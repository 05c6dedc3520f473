//! Token response of the authorization server.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Successful answer of `POST /oauth/token`.
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
pub(crate) struct TokenResponse {
    access_token: String,
    token_type: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    #[zeroize(skip)]
    scope: String,
    #[serde(default)]
    #[zeroize(skip)]
    expires_in: Option<u64>,
}

impl TokenResponse {
    /// Returns the `Authorization` header value, e.g. `BEARER <token>`.
    pub(crate) fn bearer_value(&self) -> String {
        format!("{} {}", self.token_type.to_uppercase(), self.access_token)
    }

    /// Returns the refresh token, if the server issued one.
    pub(crate) fn refresh_token(&self) -> Option<&str> {
        Some(self.refresh_token.as_str()).filter(|token| !token.is_empty())
    }

    pub(crate) fn expires_in(&self) -> Option<Duration> {
        self.expires_in.map(Duration::from_secs)
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("refresh_token", &self.refresh_token().map(|_| "[REDACTED]"))
            .field("scope", &self.scope)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}
