use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::trace::{self, TraceSink};
use super::{ApiClientError, ErrorPayload, RawResponse, Request};

/// Sends [`Request`]s and classifies the responses.
///
/// A transport never re-authenticates: a 401 is returned to the caller like any
/// other server error. Use [`ApiClient`](super::ApiClient) for calls that must
/// survive an expired access token.
///
/// Cloning is cheap, clones share the connection pool and the trace sink.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    trace: Option<TraceSink>,
}

impl Transport {
    /// Creates a new builder for configuring a transport.
    pub fn builder() -> TransportBuilder {
        TransportBuilder::default()
    }

    /// Returns `true` if exchanges are dumped to a trace sink.
    pub fn is_tracing(&self) -> bool {
        self.trace.is_some()
    }

    /// Executes a request and drains the response body.
    ///
    /// A status code below 300 is a success.
    ///
    /// # Errors
    ///
    /// - [`ApiClientError::Transport`] if no response is received,
    /// - [`ApiClientError::ServerError`] on a status code of 300 or more, with
    ///   the platform error code and description of the body,
    /// - [`ApiClientError::UnreadableResponseBody`] if a successful response
    ///   body cannot be read.
    pub async fn execute(&self, request: &Request) -> Result<RawResponse, ApiClientError> {
        if let Some(sink) = &self.trace {
            sink.emit("REQUEST:", &trace::request_dump(request));
        }

        debug!(method = %request.method(), url = %request.url(), "sending...");
        let response = self.client.execute(request.to_reqwest()).await?;
        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let is_error = status.as_u16() >= 300;

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(source) if !is_error => {
                return Err(ApiClientError::UnreadableResponseBody { source });
            }
            Err(error) => {
                warn!(%error, %status, "failed to read error response body");
                Bytes::new()
            }
        };
        debug!(%status, "...receiving");

        let response = RawResponse {
            status,
            version,
            headers,
            body,
        };
        if let Some(sink) = &self.trace {
            sink.emit("RESPONSE:", &trace::response_dump(&response));
        }

        if is_error {
            return Err(ErrorPayload::classify(&response).into_error(status));
        }
        Ok(response)
    }

    /// Executes a request and deserializes the JSON body of the response.
    ///
    /// # Errors
    ///
    /// See [`Transport::execute`] and [`RawResponse::json`].
    pub async fn execute_and_parse<T>(&self, request: &Request) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
    {
        self.execute(request).await?.json()
    }
}

/// Builder for a [`Transport`].
///
/// # Default Configuration
///
/// - **Invalid certificates**: accepted
/// - **Proxy**: taken from `HTTP_PROXY`, `HTTPS_PROXY` and `NO_PROXY`
/// - **Trace**: enabled when `CF_TRACE` is `true` or `yes`, dumped to stderr
///
/// # Example
///
/// ```rust
/// use cf_api::client::Transport;
///
/// # fn example() -> Result<(), cf_api::client::ApiClientError> {
/// let transport = Transport::builder()
///     .with_trace(false)
///     .with_accept_invalid_certs(false)
///     .build()?;
///
/// assert!(!transport.is_tracing());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TransportBuilder {
    client: Option<reqwest::Client>,
    trace: bool,
    trace_sink: Option<TraceSink>,
    accept_invalid_certs: bool,
}

impl Default for TransportBuilder {
    fn default() -> Self {
        Self {
            client: None,
            trace: trace::enabled_from_env(),
            trace_sink: None,
            accept_invalid_certs: true,
        }
    }
}

impl TransportBuilder {
    /// Builds the transport.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::Transport`] if the HTTP client cannot be
    /// initialized, e.g. when the TLS backend fails to load.
    pub fn build(self) -> Result<Transport, ApiClientError> {
        let Self {
            client,
            trace,
            trace_sink,
            accept_invalid_certs,
        } = self;

        let client = match client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .danger_accept_invalid_certs(accept_invalid_certs)
                .build()?,
        };
        let trace = trace.then(|| trace_sink.unwrap_or_else(TraceSink::stderr));

        Ok(Transport { client, trace })
    }

    /// Enables or disables the trace dump, overriding `CF_TRACE`.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Sets where the trace dump is written, stderr by default.
    ///
    /// This does not enable the trace by itself.
    pub fn with_trace_sink(mut self, sink: TraceSink) -> Self {
        self.trace_sink = Some(sink);
        self
    }

    /// Uses a preconfigured HTTP client.
    ///
    /// The certificate setting of the builder is ignored in that case.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Accepts or rejects invalid TLS certificates, accepted by default.
    pub fn with_accept_invalid_certs(mut self, accept_invalid_certs: bool) -> Self {
        self.accept_invalid_certs = accept_invalid_certs;
        self
    }
}
