use crate::session::SessionError;

/// Platform error code meaning the access token is invalid or expired.
///
/// It is the only code that triggers a token refresh.
pub const INVALID_TOKEN_CODE: i64 = 1000;

/// Errors that can occur when talking to the platform.
///
/// Use [`ApiClientError::kind`] to branch on the category of a failure, and
/// [`ApiClientError::error_code`] to read the platform error code of a server
/// error.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum ApiClientError {
    /// The request URL cannot be parsed.
    #[display("Invalid URL '{url}': {source}")]
    #[from(skip)]
    MalformedUrl {
        /// The URL as given by the caller.
        url: String,
        /// The parsing error.
        source: url::ParseError,
    },

    /// A header value contains characters that are not allowed in HTTP headers.
    #[display("Invalid header value: {_0}")]
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// The request body cannot be encoded.
    #[display("Failed to serialize request body: {message}")]
    #[from(skip)]
    SerializationError {
        /// Description of the serialization failure.
        message: String,
    },

    /// The target URL uses a scheme other than `http` or `https`.
    #[display("API endpoints should start with https:// or http://, got '{scheme}'")]
    #[from(skip)]
    UnsupportedScheme {
        /// The rejected scheme.
        scheme: String,
    },

    /// No response was received: DNS, refused connection, TLS failure, ...
    #[display("Error performing request: {_0}")]
    Transport(reqwest::Error),

    /// The authorization server rejected the credentials.
    #[display("Password in incorrect, please try again.")]
    #[from(skip)]
    InvalidCredentials,

    /// The server answered with a non-success status code.
    #[display(
        "Server error, status code: {status_code}, error code: {error_code}, message: {description}"
    )]
    #[from(skip)]
    ServerError {
        /// HTTP status code.
        status_code: u16,
        /// Platform error code, `0` when the body carries none.
        error_code: i64,
        /// Platform error description, empty when the body carries none.
        description: String,
    },

    /// The response body cannot be read.
    #[display("Could not read response body")]
    #[from(skip)]
    UnreadableResponseBody {
        /// The underlying I/O failure.
        source: reqwest::Error,
    },

    /// The response body is not valid JSON for the expected type.
    #[display("Invalid JSON response from server")]
    #[from(skip)]
    InvalidResponseBody {
        /// The deserialization failure, with the JSON path where it occurred.
        source: serde_path_to_error::Error<serde_json::Error>,
    },

    /// A refresh was requested but the session has no refresh token.
    #[display("No refresh token available, please log in again")]
    #[from(skip)]
    NoRefreshToken,

    /// The credential store failed.
    Session(SessionError),
}

/// Categories of [`ApiClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request could not be built.
    InvalidRequest,
    /// No response was received. Never retried.
    Transport,
    /// 401 with the invalid token code. Retried once after a refresh.
    AuthExpired,
    /// The authorization server rejected the credentials.
    InvalidCredentials,
    /// Any other non-success response.
    ServerError,
    /// The response body is unreadable or has an unexpected shape.
    InvalidResponseBody,
    /// The session cannot be read or updated.
    Session,
}

impl ApiClientError {
    /// Returns the category of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedUrl { .. }
            | Self::InvalidHeaderValue(_)
            | Self::SerializationError { .. }
            | Self::UnsupportedScheme { .. } => ErrorKind::InvalidRequest,
            Self::Transport(_) => ErrorKind::Transport,
            Self::InvalidCredentials => ErrorKind::InvalidCredentials,
            Self::ServerError { .. } if self.is_auth_expired() => ErrorKind::AuthExpired,
            Self::ServerError { .. } => ErrorKind::ServerError,
            Self::UnreadableResponseBody { .. } | Self::InvalidResponseBody { .. } => {
                ErrorKind::InvalidResponseBody
            }
            Self::NoRefreshToken | Self::Session(_) => ErrorKind::Session,
        }
    }

    /// Returns the platform error code of a server error.
    pub fn error_code(&self) -> Option<i64> {
        match self {
            Self::ServerError { error_code, .. } => Some(*error_code),
            _ => None,
        }
    }

    /// Returns the HTTP status code, if a response was received and rejected.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ServerError { status_code, .. } => Some(*status_code),
            Self::InvalidCredentials => Some(401),
            _ => None,
        }
    }

    /// Returns `true` on a 401 carrying [`INVALID_TOKEN_CODE`].
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::ServerError {
                status_code: 401,
                error_code: INVALID_TOKEN_CODE,
                ..
            }
        )
    }
}
