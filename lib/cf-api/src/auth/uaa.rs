use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use http::{Method, StatusCode};
use serde::Serialize;
use tracing::debug;

use super::token::TokenResponse;
use super::{Authenticator, CLIENT_ID};
use crate::client::{ApiClientError, Request, RequestBody, Transport};
use crate::session::CredentialStore;

#[derive(Serialize)]
struct PasswordGrant<'a> {
    grant_type: &'static str,
    username: &'a str,
    password: &'a str,
    scope: &'static str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
    scope: &'static str,
}

/// [`Authenticator`] talking to the `/oauth/token` endpoint of the session's
/// authorization server.
#[derive(Debug, Clone)]
pub struct UaaAuthenticator<S> {
    transport: Transport,
    store: S,
}

impl<S> UaaAuthenticator<S>
where
    S: CredentialStore,
{
    /// Creates an authenticator sending its token requests through `transport`.
    pub fn new(transport: Transport, store: S) -> Self {
        Self { transport, store }
    }

    /// Returns the store receiving the tokens.
    pub fn store(&self) -> &S {
        &self.store
    }

    async fn exchange(
        &self,
        authorization_endpoint: &str,
        body: RequestBody,
    ) -> Result<TokenResponse, ApiClientError> {
        let url = format!("{}/oauth/token", authorization_endpoint.trim_end_matches('/'));
        let client_auth = format!("Basic {}", STANDARD.encode(format!("{CLIENT_ID}:")));
        let request = Request::new(Method::POST, &url, &client_auth, Some(body))?;

        let token: TokenResponse = match self.transport.execute_and_parse(&request).await {
            Err(ApiClientError::ServerError { status_code, .. })
                if status_code == StatusCode::UNAUTHORIZED.as_u16() =>
            {
                return Err(ApiClientError::InvalidCredentials);
            }
            result => result?,
        };
        debug!(expires_in = ?token.expires_in(), "token granted");
        Ok(token)
    }
}

impl<S> Authenticator for UaaAuthenticator<S>
where
    S: CredentialStore,
{
    async fn authenticate(&self, username: &str, password: &str) -> Result<(), ApiClientError> {
        let mut credentials = self.store.get()?;
        let grant = PasswordGrant {
            grant_type: "password",
            username,
            password,
            scope: "",
        };

        let token = self
            .exchange(&credentials.authorization_endpoint, RequestBody::form(&grant)?)
            .await?;

        credentials.access_token = token.bearer_value().into();
        credentials.refresh_token = token.refresh_token().unwrap_or_default().into();
        self.store.save(&credentials)?;
        Ok(())
    }

    async fn refresh_auth_token(&self) -> Result<String, ApiClientError> {
        let mut credentials = self.store.get()?;
        if credentials.refresh_token.is_empty() {
            return Err(ApiClientError::NoRefreshToken);
        }
        let grant = RefreshGrant {
            grant_type: "refresh_token",
            refresh_token: credentials.refresh_token.expose(),
            scope: "",
        };
        let body = RequestBody::form(&grant)?;

        let token = self
            .exchange(&credentials.authorization_endpoint, body)
            .await?;

        let access_token = token.bearer_value();
        credentials.access_token = access_token.clone().into();
        if let Some(refresh_token) = token.refresh_token() {
            credentials.refresh_token = refresh_token.into();
        }
        self.store.save(&credentials)?;
        Ok(access_token)
    }
}
