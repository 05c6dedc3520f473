//! Redaction of secrets from diagnostic dumps.
//!
//! The trace output of the client contains raw request and response text. Before
//! anything reaches the trace sink it goes through [`sanitize`], which replaces
//! credentials with [`PRIVATE_DATA_PLACEHOLDER`]:
//!
//! - the value of an `Authorization` header line,
//! - the `password=` and `refresh_token=` fields of a URL-encoded form,
//! - the `access_token` and `refresh_token` fields of a JSON body.
//!
//! Each substitution works on substrings only, so a partially valid dump (a JSON
//! body cut in the middle, a form with unknown fields) is still redacted.

use std::sync::LazyLock;

use regex::Regex;

/// Text written in place of every redacted secret.
pub const PRIVATE_DATA_PLACEHOLDER: &str = "[PRIVATE DATA HIDDEN]";

static REDACTIONS: LazyLock<[(Regex, String); 5]> = LazyLock::new(|| {
    [
        (
            Regex::new(r"(?mi)^(?<name>authorization): [^\r\n]*").expect("a valid regex"),
            format!("${{name}}: {PRIVATE_DATA_PLACEHOLDER}"),
        ),
        (
            Regex::new(r"password=[^&]*&").expect("a valid regex"),
            format!("password={PRIVATE_DATA_PLACEHOLDER}&"),
        ),
        (
            Regex::new(r"refresh_token=[^&]*&").expect("a valid regex"),
            format!("refresh_token={PRIVATE_DATA_PLACEHOLDER}&"),
        ),
        (
            Regex::new(r#"(?<key>"access_token"\s*:\s*")[^"]*""#).expect("a valid regex"),
            format!("${{key}}{PRIVATE_DATA_PLACEHOLDER}\""),
        ),
        (
            Regex::new(r#"(?<key>"refresh_token"\s*:\s*")[^"]*""#).expect("a valid regex"),
            format!("${{key}}{PRIVATE_DATA_PLACEHOLDER}\""),
        ),
    ]
});

/// Returns a copy of `input` with every credential replaced by the placeholder.
///
/// Running it on already sanitized text returns the same text.
///
/// ```rust
/// use cf_api::sanitize::{PRIVATE_DATA_PLACEHOLDER, sanitize};
///
/// let dump = "POST /oauth/token HTTP/1.1\r\nAuthorization: Basic Y2Y6\r\n";
/// let sanitized = sanitize(dump);
///
/// assert!(!sanitized.contains("Y2Y6"));
/// assert!(sanitized.contains(PRIVATE_DATA_PLACEHOLDER));
/// ```
pub fn sanitize(input: &str) -> String {
    let mut sanitized = input.to_owned();
    for (pattern, replacement) in REDACTIONS.iter() {
        sanitized = pattern
            .replace_all(&sanitized, replacement.as_str())
            .into_owned();
    }
    sanitized
}
