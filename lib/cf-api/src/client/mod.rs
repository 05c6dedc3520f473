//! Authenticated calls to the platform API.
//!
//! A [`Request`] carries the stored access token. The [`Transport`] sends it,
//! drains the response and turns any status code of 300 or more into an
//! [`ApiClientError::ServerError`]. The [`ApiClient`] adds one recovery on top:
//! when the platform answers 401 with [`INVALID_TOKEN_CODE`], it asks its
//! [`Authenticator`] for a fresh token and sends the request once more.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::{Authenticator, UaaAuthenticator};
use crate::session::CredentialStore;

mod body;
mod error;
mod request;
mod response;
pub mod trace;
mod transport;

pub use self::body::RequestBody;
pub use self::error::{ApiClientError, ErrorKind, INVALID_TOKEN_CODE};
pub use self::request::Request;
pub use self::response::{ErrorPayload, RawResponse};
pub use self::trace::TraceSink;
pub use self::transport::{Transport, TransportBuilder};

/// A client that refreshes an expired access token once per request.
#[derive(Debug, Clone)]
pub struct ApiClient<A> {
    transport: Transport,
    authenticator: A,
}

impl<S> ApiClient<UaaAuthenticator<S>>
where
    S: CredentialStore,
{
    /// Creates a client refreshing tokens against the authorization endpoint
    /// of the session in `store`.
    pub fn for_session(transport: Transport, store: S) -> Self {
        let authenticator = UaaAuthenticator::new(transport.clone(), store);
        Self::new(transport, authenticator)
    }
}

impl<A> ApiClient<A>
where
    A: Authenticator,
{
    /// Creates a client refreshing expired tokens with `authenticator`.
    pub fn new(transport: Transport, authenticator: A) -> Self {
        Self {
            transport,
            authenticator,
        }
    }

    /// Returns the transport, for calls that must not re-authenticate.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Returns the authenticator, e.g. to log in.
    pub fn authenticator(&self) -> &A {
        &self.authenticator
    }

    /// Executes a request, refreshing the access token if it expired.
    ///
    /// The request is sent at most twice: a second 401 is returned as is. If
    /// the refresh fails, the error of the first attempt is returned.
    ///
    /// # Errors
    ///
    /// See [`Transport::execute`].
    pub async fn execute_with_reauth(
        &self,
        mut request: Request,
    ) -> Result<RawResponse, ApiClientError> {
        let error = match self.transport.execute(&request).await {
            Ok(response) => return Ok(response),
            Err(error) if error.is_auth_expired() => error,
            Err(error) => return Err(error),
        };

        debug!(url = %request.url(), "access token expired, refreshing");
        let access_token = match self.authenticator.refresh_auth_token().await {
            Ok(access_token) => access_token,
            Err(refresh_error) => {
                warn!(%refresh_error, "failed to refresh the access token");
                return Err(error);
            }
        };

        request.set_authorization(&access_token)?;
        self.transport.execute(&request).await
    }

    /// Executes a request and discards the response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute_with_reauth`].
    pub async fn perform_request(&self, request: Request) -> Result<(), ApiClientError> {
        self.execute_with_reauth(request).await?;
        Ok(())
    }

    /// Executes a request and deserializes the JSON body of the response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::execute_with_reauth`] and [`RawResponse::json`].
    pub async fn execute_and_parse<T>(&self, request: Request) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
    {
        self.execute_with_reauth(request).await?.json()
    }
}
