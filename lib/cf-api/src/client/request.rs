use std::sync::LazyLock;

use headers::HeaderMapExt;
use http::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use http::{HeaderMap, HeaderValue, Method};
use serde::Serialize;
use url::Url;

use super::{ApiClientError, RequestBody};

static USER_AGENT_VALUE: LazyLock<HeaderValue> = LazyLock::new(|| {
    let user_agent = format!(
        "{} {} / {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    );
    HeaderValue::from_str(&user_agent).expect("a valid user agent")
});

/// An outbound request carrying the standard platform headers.
///
/// Every request has an `Authorization` header set verbatim from the stored
/// session, `Accept: application/json` and a `User-Agent` naming this client.
/// Only the retry path is allowed to overwrite the authorization afterwards.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<RequestBody>,
}

impl Request {
    /// Builds a request.
    ///
    /// An empty `authorization` is legal and produces an unauthenticated
    /// request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::MalformedUrl`] if `url` cannot be parsed and
    /// [`ApiClientError::InvalidHeaderValue`] if `authorization` contains
    /// characters not allowed in a header.
    pub fn new(
        method: Method,
        url: &str,
        authorization: &str,
        body: Option<RequestBody>,
    ) -> Result<Self, ApiClientError> {
        let parsed = Url::parse(url).map_err(|source| ApiClientError::MalformedUrl {
            url: url.to_owned(),
            source,
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization_value(authorization)?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, USER_AGENT_VALUE.clone());
        if let Some(body) = &body {
            headers.typed_insert(body.content_type.clone());
        }

        Ok(Self {
            method,
            url: parsed,
            headers,
            body,
        })
    }

    /// Builds a `GET` request without body.
    ///
    /// # Errors
    ///
    /// See [`Request::new`].
    pub fn get(url: &str, authorization: &str) -> Result<Self, ApiClientError> {
        Self::new(Method::GET, url, authorization, None)
    }

    /// Builds a `DELETE` request without body.
    ///
    /// # Errors
    ///
    /// See [`Request::new`].
    pub fn delete(url: &str, authorization: &str) -> Result<Self, ApiClientError> {
        Self::new(Method::DELETE, url, authorization, None)
    }

    /// Builds a `POST` request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Request::new`] and [`RequestBody::json`].
    pub fn post_json<T>(url: &str, authorization: &str, payload: &T) -> Result<Self, ApiClientError>
    where
        T: Serialize + ?Sized,
    {
        let body = RequestBody::json(payload)?;
        Self::new(Method::POST, url, authorization, Some(body))
    }

    /// Builds a `PUT` request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Request::new`] and [`RequestBody::json`].
    pub fn put_json<T>(url: &str, authorization: &str, payload: &T) -> Result<Self, ApiClientError>
    where
        T: Serialize + ?Sized,
    {
        let body = RequestBody::json(payload)?;
        Self::new(Method::PUT, url, authorization, Some(body))
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the headers, `Authorization` included.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body, if any.
    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    pub(crate) fn set_authorization(&mut self, authorization: &str) -> Result<(), ApiClientError> {
        self.headers
            .insert(AUTHORIZATION, authorization_value(authorization)?);
        Ok(())
    }

    /// Converts into a reqwest request, the body bytes are shared not copied.
    pub(super) fn to_reqwest(&self) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method.clone(), self.url.clone());
        request.headers_mut().clone_from(&self.headers);
        if let Some(body) = &self.body {
            *request.body_mut() = Some(reqwest::Body::from(body.data.clone()));
        }
        request
    }
}

fn authorization_value(authorization: &str) -> Result<HeaderValue, ApiClientError> {
    let mut value = HeaderValue::from_str(authorization)?;
    value.set_sensitive(true);
    Ok(value)
}
