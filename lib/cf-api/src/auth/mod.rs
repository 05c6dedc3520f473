//! OAuth2 authentication against the authorization server of the platform.
//!
//! The platform uses the resource owner password grant with a public client:
//! [`CLIENT_ID`] with an empty secret. Tokens obtained there are written to the
//! [`CredentialStore`](crate::session::CredentialStore), so every later request
//! picks them up.

use std::future::Future;

use crate::client::ApiClientError;

mod token;
mod uaa;

pub use self::uaa::UaaAuthenticator;

/// Public OAuth2 client id of the command-line client.
pub const CLIENT_ID: &str = "cf";

/// Obtains and renews the access token of the session.
pub trait Authenticator: Send + Sync {
    /// Logs in with a username and a password.
    ///
    /// On success the new access and refresh tokens are saved. On failure the
    /// stored tokens are left untouched.
    fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<(), ApiClientError>> + Send;

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// Returns the new `Authorization` header value, which is also saved.
    fn refresh_auth_token(&self) -> impl Future<Output = Result<String, ApiClientError>> + Send;
}
