#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cf_api::auth::Authenticator;
use cf_api::client::{ApiClientError, TraceSink, Transport};
use cf_api::session::{Credentials, MemoryCredentialStore};
use rstest::fixture;
use tracing::info;
use wiremock::MockServer;

pub const TOKEN_BODY: &str = r#"{"access_token":"my_access_token","token_type":"BEARER","refresh_token":"my_refresh_token","scope":"openid","expires_in":98765}"#;

pub const INVALID_TOKEN_BODY: &str =
    r#"{"code":1000,"description":"Invalid Auth Token","error_code":"CF-InvalidAuthToken"}"#;

pub fn init_tracing() {
    // should be run once, fail otherwise, we skip that error
    let _ = tracing_subscriber::fmt()
        .pretty()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    info!("Tracing initialized");
}

#[fixture]
pub async fn server() -> MockServer {
    init_tracing();
    MockServer::start().await
}

pub fn transport() -> Transport {
    match Transport::builder().with_trace(false).build() {
        Ok(transport) => transport,
        Err(error) => panic!("fail to build transport: {error:?}"),
    }
}

pub fn traced_transport(buffer: &SharedBuffer) -> Transport {
    let sink = TraceSink::from_writer(buffer.clone());
    match Transport::builder()
        .with_trace(true)
        .with_trace_sink(sink)
        .build()
    {
        Ok(transport) => transport,
        Err(error) => panic!("fail to build transport: {error:?}"),
    }
}

/// A session targeting the mock server, not logged in.
pub fn anonymous_store(server: &MockServer) -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::new(Credentials {
        target: server.uri(),
        api_version: "2.0.0".to_owned(),
        authorization_endpoint: server.uri(),
        ..Credentials::default()
    }))
}

/// A session targeting the mock server with `BEARER old_access_token`.
pub fn logged_in_store(server: &MockServer) -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::new(Credentials {
        target: server.uri(),
        api_version: "2.0.0".to_owned(),
        authorization_endpoint: server.uri(),
        access_token: "BEARER old_access_token".into(),
        refresh_token: "old_refresh_token".into(),
        ..Credentials::default()
    }))
}

/// An authenticator counting refreshes, without any network call.
#[derive(Debug)]
pub struct FakeAuthenticator {
    refreshed_token: Option<String>,
    refresh_count: AtomicUsize,
}

impl FakeAuthenticator {
    pub fn refreshing_to(token: &str) -> Self {
        Self {
            refreshed_token: Some(token.to_owned()),
            refresh_count: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            refreshed_token: None,
            refresh_count: AtomicUsize::new(0),
        }
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_count.load(Ordering::SeqCst)
    }
}

impl Authenticator for FakeAuthenticator {
    async fn authenticate(&self, _username: &str, _password: &str) -> Result<(), ApiClientError> {
        Ok(())
    }

    async fn refresh_auth_token(&self) -> Result<String, ApiClientError> {
        self.refresh_count.fetch_add(1, Ordering::SeqCst);
        self.refreshed_token
            .clone()
            .ok_or(ApiClientError::NoRefreshToken)
    }
}

/// A trace sink writer that can be read back.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().expect("buffer lock").clone();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("buffer lock").write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
