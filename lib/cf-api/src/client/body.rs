use bytes::Bytes;
use headers::ContentType;
use serde::Serialize;

use super::ApiClientError;

/// The body of an outbound request with its content type.
///
/// The data is kept as [`Bytes`] so a request can be sent again after a token
/// refresh without re-encoding the payload.
#[derive(Clone, derive_more::Debug)]
pub struct RequestBody {
    pub(super) content_type: ContentType,
    #[debug(ignore)]
    pub(super) data: Bytes,
}

impl RequestBody {
    /// Creates an `application/json` body from a serializable payload.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::SerializationError`] if the payload cannot be
    /// serialized.
    pub fn json<T>(payload: &T) -> Result<Self, ApiClientError>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_vec(payload).map_err(|err| {
            ApiClientError::SerializationError {
                message: format!("Failed to serialize JSON data: {err}"),
            }
        })?;

        Ok(Self {
            content_type: ContentType::json(),
            data: Bytes::from(data),
        })
    }

    /// Creates an `application/x-www-form-urlencoded` body.
    ///
    /// Fields are encoded in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::SerializationError`] if the payload is not a
    /// flat sequence of key/value pairs.
    pub fn form<T>(payload: &T) -> Result<Self, ApiClientError>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_urlencoded::to_string(payload).map_err(|err| {
            ApiClientError::SerializationError {
                message: format!("Failed to serialize form data: {err}"),
            }
        })?;

        Ok(Self {
            content_type: ContentType::form_url_encoded(),
            data: Bytes::from(data),
        })
    }

    /// Creates a body from raw bytes, already encoded as `content_type`.
    pub fn raw(data: impl Into<Bytes>, content_type: ContentType) -> Self {
        Self {
            content_type,
            data: data.into(),
        }
    }

    /// Returns the content type of the body.
    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// Returns the encoded body.
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}
