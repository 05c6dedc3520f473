//! Opt-in dump of the raw HTTP exchanges.
//!
//! When [`TRACE_ENV_VAR`] is `true` or `yes`, the transport writes every
//! request and response in wire format to a [`TraceSink`], after passing it
//! through [`sanitize`](crate::sanitize::sanitize).

use std::fmt::{self, Write as _};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use http::{HeaderMap, HeaderName};
use tracing::warn;

use super::{RawResponse, Request};
use crate::sanitize::sanitize;

/// Environment variable enabling the trace dump.
pub const TRACE_ENV_VAR: &str = "CF_TRACE";

/// Returns `true` if [`TRACE_ENV_VAR`] asks for the trace dump.
pub fn enabled_from_env() -> bool {
    is_enabled(std::env::var(TRACE_ENV_VAR).ok().as_deref())
}

fn is_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|value| {
        let value = value.trim();
        value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
    })
}

/// Destination of the trace dump, shared by every clone of a transport.
#[derive(Clone)]
pub struct TraceSink(Arc<Mutex<dyn Write + Send>>);

impl TraceSink {
    /// Writes the dump to the standard error.
    pub fn stderr() -> Self {
        Self::from_writer(io::stderr())
    }

    /// Writes the dump to `writer`.
    pub fn from_writer<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self(Arc::new(Mutex::new(writer)))
    }

    pub(super) fn emit(&self, title: &str, dump: &str) {
        let Ok(mut writer) = self.0.lock() else {
            warn!("trace sink is poisoned, skipping dump");
            return;
        };
        let written =
            write!(writer, "\n{title}\n{}\n", sanitize(dump)).and_then(|()| writer.flush());
        if let Err(error) = written {
            warn!(%error, "failed to write trace dump");
        }
    }
}

impl fmt::Debug for TraceSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TraceSink")
    }
}

pub(super) fn request_dump(request: &Request) -> String {
    let url = request.url();
    let mut dump = format!("{} {}", request.method(), url.path());
    if let Some(query) = url.query() {
        let _ = write!(dump, "?{query}");
    }
    let _ = write!(dump, " HTTP/1.1\r\nHost: {}", url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        let _ = write!(dump, ":{port}");
    }
    dump.push_str("\r\n");
    write_headers(&mut dump, request.headers());
    if let Some(body) = request.body() {
        dump.push_str(&String::from_utf8_lossy(body.data()));
    }
    dump
}

pub(super) fn response_dump(response: &RawResponse) -> String {
    let mut dump = format!("{:?} {}\r\n", response.version(), response.status());
    write_headers(&mut dump, response.headers());
    dump.push_str(&response.text());
    dump
}

fn write_headers(dump: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let _ = write!(
            dump,
            "{}: {}\r\n",
            canonical_name(name),
            String::from_utf8_lossy(value.as_bytes())
        );
    }
    dump.push_str("\r\n");
}

/// `content-type` becomes `Content-Type`.
fn canonical_name(name: &HeaderName) -> String {
    let mut canonical = String::with_capacity(name.as_str().len());
    let mut upper = true;
    for ch in name.as_str().chars() {
        if upper {
            canonical.push(ch.to_ascii_uppercase());
        } else {
            canonical.push(ch);
        }
        upper = ch == '-';
    }
    canonical
}
