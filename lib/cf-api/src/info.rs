//! Discovery of a platform API root.

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::client::{ApiClientError, Request, Transport};
use crate::session::{CredentialStore, Credentials, SessionError};

/// What the platform reports on `GET /v2/info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiInfo {
    /// Version of the platform API.
    pub api_version: String,
    /// Root URL of the authorization server.
    pub authorization_endpoint: String,
}

/// Fetches the [`ApiInfo`] of `target` without authentication.
///
/// # Errors
///
/// Returns [`ApiClientError::UnsupportedScheme`] before any network call if
/// `target` is neither `http` nor `https`, and the errors of
/// [`Transport::execute_and_parse`] otherwise.
pub async fn fetch_api_info(
    transport: &Transport,
    target: &str,
) -> Result<ApiInfo, ApiClientError> {
    let url = format!("{}/v2/info", target.trim_end_matches('/'));
    let parsed = Url::parse(&url).map_err(|source| match source {
        url::ParseError::RelativeUrlWithoutBase => ApiClientError::UnsupportedScheme {
            scheme: String::new(),
        },
        source => ApiClientError::MalformedUrl {
            url: target.to_owned(),
            source,
        },
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiClientError::UnsupportedScheme {
            scheme: parsed.scheme().to_owned(),
        });
    }

    let request = Request::get(&url, "")?;
    let info: ApiInfo = transport.execute_and_parse(&request).await?;
    debug!(api_version = %info.api_version, "target info fetched");
    Ok(info)
}

/// Points the session at a new target.
///
/// The previous session is cleared first, so the user has to log in again.
///
/// # Errors
///
/// Returns a [`SessionError`] if the store cannot be read or written.
pub fn retarget<S>(store: &S, target: &str, info: &ApiInfo) -> Result<Credentials, SessionError>
where
    S: CredentialStore + ?Sized,
{
    store.clear_session()?;
    let mut credentials = store.get()?;
    credentials.target = target.to_owned();
    credentials.api_version.clone_from(&info.api_version);
    credentials
        .authorization_endpoint
        .clone_from(&info.authorization_endpoint);
    store.save(&credentials)?;
    Ok(credentials)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::session::MemoryCredentialStore;

    #[rstest]
    #[case::ftp("ftp://api.example.com", "ftp")]
    #[case::no_scheme("api.example.com", "")]
    #[case::host_and_port("localhost:8080", "localhost")]
    #[tokio::test]
    async fn should_reject_unsupported_scheme(
        #[case] target: &str,
        #[case] expected: &str,
    ) -> anyhow::Result<()> {
        let transport = Transport::builder().with_trace(false).build()?;

        let result = fetch_api_info(&transport, target).await;

        let Err(ApiClientError::UnsupportedScheme { scheme }) = result else {
            panic!("expected an unsupported scheme error, got {result:?}");
        };
        assert_eq!(scheme, expected);
        Ok(())
    }

    #[test]
    fn should_deserialize_info() -> anyhow::Result<()> {
        let info: ApiInfo = serde_json::from_str(
            r#"{"name":"vcap","build":"2222","api_version":"2.0.0","authorization_endpoint":"https://login.example.com"}"#,
        )?;

        assert_eq!(info.api_version, "2.0.0");
        assert_eq!(info.authorization_endpoint, "https://login.example.com");
        Ok(())
    }

    #[test]
    fn should_retarget_with_a_fresh_session() -> anyhow::Result<()> {
        let store = MemoryCredentialStore::new(Credentials {
            target: "https://api.old.example.com".to_owned(),
            access_token: "BEARER old".into(),
            refresh_token: "old_refresh".into(),
            ..Credentials::default()
        });
        let info = ApiInfo {
            api_version: "2.1.0".to_owned(),
            authorization_endpoint: "https://login.example.com".to_owned(),
        };

        let credentials = retarget(&store, "https://api.example.com", &info)?;

        assert_eq!(credentials, store.get()?);
        assert_eq!(credentials.target, "https://api.example.com");
        assert_eq!(credentials.api_version, "2.1.0");
        assert_eq!(credentials.authorization_endpoint, "https://login.example.com");
        assert!(!credentials.is_logged_in());
        assert!(credentials.refresh_token.is_empty());
        Ok(())
    }
}
