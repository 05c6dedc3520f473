//! # cf-api
//!
//! The authenticated request pipeline of the platform command-line client.
//!
//! Resource commands build a [`Request`](client::Request) carrying the access
//! token of the session and hand it to an [`ApiClient`](client::ApiClient).
//! The client sends it over a [`Transport`](client::Transport), classifies a
//! non-success answer into an [`ApiClientError`](client::ApiClientError), and
//! recovers from an expired access token with a single refresh-and-retry.
//!
//! The session itself lives behind a [`CredentialStore`](session::CredentialStore)
//! owned by the caller.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use cf_api::auth::Authenticator;
//! use cf_api::client::{ApiClient, Request, Transport};
//! use cf_api::info::{fetch_api_info, retarget};
//! use cf_api::session::{CredentialStore, MemoryCredentialStore};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Page {
//!     total_results: u32,
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryCredentialStore::default());
//! let transport = Transport::builder().build()?;
//!
//! // Point the session at a platform
//! let info = fetch_api_info(&transport, "https://api.example.com").await?;
//! retarget(store.as_ref(), "https://api.example.com", &info)?;
//!
//! // Log in, then call a resource endpoint
//! let client = ApiClient::for_session(transport, Arc::clone(&store));
//! client.authenticator().authenticate("user@example.com", "secret").await?;
//!
//! let access_token = store.get()?.access_token;
//! let request = Request::get("https://api.example.com/v2/apps", access_token.expose())?;
//! let page: Page = client.execute_and_parse(request).await?;
//! println!("{} apps", page.total_results);
//! # Ok(())
//! # }
//! ```
//!
//! ## Tracing
//!
//! Set `CF_TRACE=true` to dump every exchange to stderr. Credentials are
//! replaced by [`PRIVATE_DATA_PLACEHOLDER`](sanitize::PRIVATE_DATA_PLACEHOLDER)
//! before anything is written.

pub mod auth;
pub mod client;
pub mod info;
pub mod sanitize;
mod secret;
pub mod session;

pub use self::secret::SecretString;
