use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::ApiClientError;

/// A response whose body has already been drained into memory.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub(super) status: StatusCode,
    pub(super) version: Version,
    pub(super) headers: HeaderMap,
    pub(super) body: Bytes,
}

impl RawResponse {
    /// Returns the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the HTTP version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserializes the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::InvalidResponseBody`] if the body is not a JSON
    /// representation of `T`. The error source carries the path of the
    /// offending field.
    pub fn json<T>(&self) -> Result<T, ApiClientError>
    where
        T: DeserializeOwned,
    {
        let deserializer = &mut serde_json::Deserializer::from_slice(&self.body);
        serde_path_to_error::deserialize(deserializer)
            .map_err(|source| ApiClientError::InvalidResponseBody { source })
    }
}

/// The error body returned by the platform on a non-success status.
///
/// Keys match case-insensitively, an exact match wins. Each field defaults to
/// its zero value when absent or of the wrong type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorPayload {
    /// Platform error code.
    pub code: i64,
    /// Human readable description of the error.
    pub description: String,
}

impl ErrorPayload {
    /// Parses an error body, a body that is not a JSON object gives the zero
    /// payload.
    pub fn from_body(body: &[u8]) -> Self {
        let Ok(Value::Object(object)) = serde_json::from_slice::<Value>(body) else {
            return Self::default();
        };

        Self {
            code: field(&object, "code")
                .and_then(Value::as_i64)
                .unwrap_or_default(),
            description: field(&object, "description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
        }
    }

    /// Parses the error body of a drained response.
    pub fn classify(response: &RawResponse) -> Self {
        Self::from_body(&response.body)
    }

    pub(super) fn into_error(self, status: StatusCode) -> ApiClientError {
        ApiClientError::ServerError {
            status_code: status.as_u16(),
            error_code: self.code,
            description: self.description,
        }
    }
}

fn field<'a>(object: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    object.get(name).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde::Deserialize;

    use super::*;

    fn response(status: StatusCode, body: &'static str) -> RawResponse {
        RawResponse {
            status,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[rstest]
    #[case::lowercase(r#"{"code":1000,"description":"Invalid Auth Token"}"#)]
    #[case::capitalized(r#"{"Code":1000,"Description":"Invalid Auth Token"}"#)]
    #[case::uppercase(r#"{"CODE":1000,"DESCRIPTION":"Invalid Auth Token"}"#)]
    #[case::mixed_case(r#"{"cOdE":1000,"deSCRIPTION":"Invalid Auth Token"}"#)]
    #[case::extra_fields(
        r#"{"code":1000,"description":"Invalid Auth Token","error_code":"CF-InvalidAuthToken"}"#
    )]
    fn should_parse_error_payload(#[case] body: &'static str) {
        let payload = ErrorPayload::classify(&response(StatusCode::UNAUTHORIZED, body));

        assert_eq!(
            payload,
            ErrorPayload {
                code: 1000,
                description: "Invalid Auth Token".to_owned(),
            }
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::html("<html><body>Bad Gateway</body></html>")]
    #[case::truncated(r#"{"code":10"#)]
    #[case::wrong_type(r#"{"code":"CF-1000"}"#)]
    #[case::string(r#""Invalid Auth Token""#)]
    #[case::array("[1, 2, 3]")]
    fn should_give_zero_payload_on_unparseable_body(#[case] body: &'static str) {
        assert_eq!(ErrorPayload::from_body(body.as_bytes()), ErrorPayload::default());
    }

    #[test]
    fn should_keep_partial_payload() {
        let payload = ErrorPayload::from_body(br#"{"description":"Not Found"}"#);

        assert_eq!(payload.code, 0);
        assert_eq!(payload.description, "Not Found");
    }

    #[test]
    fn should_keep_description_when_code_has_wrong_type() {
        let payload = ErrorPayload::from_body(
            br#"{"code":"CF-InvalidAuthToken","description":"Invalid Auth Token"}"#,
        );

        assert_eq!(payload.code, 0);
        assert_eq!(payload.description, "Invalid Auth Token");
    }

    #[test]
    fn should_keep_code_when_description_has_wrong_type() {
        let payload = ErrorPayload::from_body(br#"{"code":1000,"description":null}"#);

        assert_eq!(payload.code, 1000);
        assert_eq!(payload.description, "");
    }

    #[test]
    fn should_prefer_exact_key_match() {
        let payload =
            ErrorPayload::from_body(br#"{"Code":1,"code":1000,"DESCRIPTION":"Not Found"}"#);

        assert_eq!(payload.code, 1000);
        assert_eq!(payload.description, "Not Found");
    }

    #[test]
    fn should_convert_payload_into_server_error() {
        let payload = ErrorPayload {
            code: 10010,
            description: "The app could not be found: 123".to_owned(),
        };

        let error = payload.into_error(StatusCode::NOT_FOUND);

        assert_eq!(
            error.to_string(),
            "Server error, status code: 404, error code: 10010, message: The app could not be found: 123"
        );
    }

    #[derive(Debug, Deserialize)]
    struct App {
        #[allow(dead_code)]
        name: String,
        instances: u32,
    }

    #[test]
    fn should_deserialize_json_body() -> anyhow::Result<()> {
        let app: App = response(StatusCode::OK, r#"{"name":"my-app","instances":3}"#).json()?;

        assert_eq!(app.instances, 3);
        Ok(())
    }

    #[test]
    fn should_report_invalid_json_body_with_path() {
        let result =
            response(StatusCode::OK, r#"{"name":"my-app","instances":"three"}"#).json::<App>();

        let Err(ApiClientError::InvalidResponseBody { source }) = result else {
            panic!("expected an invalid response body error, got {result:?}");
        };
        assert_eq!(source.path().to_string(), "instances");
    }
}
