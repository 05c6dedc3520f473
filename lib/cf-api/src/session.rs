//! Session state shared by the authenticator and the resource callers.
//!
//! The crate does not persist anything itself. It reads and writes the
//! [`Credentials`] through a [`CredentialStore`], and the command-line layer
//! decides where they live (a JSON file in the user's home, a keychain, ...).
//! [`MemoryCredentialStore`] keeps them in memory.
//!
//! Calls are sequential (one command per process), so a store is accessed by a
//! single writer at a time: a token refresh saves the new token before the
//! retried request reads it.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::secret::SecretString;

/// Errors raised by a [`CredentialStore`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Error, derive_more::Display)]
pub enum SessionError {
    /// The backing storage could not be read or written.
    #[display("Credential store unavailable: {message}")]
    Unavailable {
        /// What went wrong.
        message: String,
    },

    /// A previous writer panicked while holding the store.
    #[display("Credential store is poisoned")]
    Poisoned,
}

/// A named platform entity the session is targeting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Platform identifier.
    pub guid: String,
    /// Display name.
    pub name: String,
}

/// A space inside the targeted organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    /// Platform identifier.
    pub guid: String,
    /// Display name.
    pub name: String,
}

/// The session of the command-line client.
///
/// `access_token` holds the full `Authorization` header value, token type
/// included (`"BEARER <token>"`). It is non-empty if and only if the user is
/// logged in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Root URL of the platform API, e.g. `https://api.example.com`.
    pub target: String,
    /// Version reported by the platform on `/v2/info`.
    pub api_version: String,
    /// Root URL of the authorization server.
    pub authorization_endpoint: String,
    /// Value of the `Authorization` header for resource requests.
    pub access_token: SecretString,
    /// Refresh token of the OAuth2 exchange.
    pub refresh_token: SecretString,
    /// Targeted organization, if any.
    pub organization: Option<Organization>,
    /// Targeted space, if any.
    pub space: Option<Space>,
}

impl Credentials {
    /// Creates credentials for a target without any session.
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// Returns `true` if an access token is stored.
    pub fn is_logged_in(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Returns `true` if an organization is targeted.
    pub fn has_organization(&self) -> bool {
        self.organization.is_some()
    }

    /// Returns `true` if a space is targeted.
    pub fn has_space(&self) -> bool {
        self.space.is_some()
    }

    /// Wipes every session field, keeping the target.
    pub fn clear_session(&mut self) {
        let target = std::mem::take(&mut self.target);
        *self = Self::for_target(target);
    }
}

/// Storage of the [`Credentials`], owned by the caller.
pub trait CredentialStore: Send + Sync {
    /// Returns the current credentials.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the storage cannot be read.
    fn get(&self) -> Result<Credentials, SessionError>;

    /// Replaces the stored credentials.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the storage cannot be written.
    fn save(&self, credentials: &Credentials) -> Result<(), SessionError>;

    /// Wipes tokens, endpoints, organization and space while keeping the target.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the storage cannot be written.
    fn clear_session(&self) -> Result<(), SessionError> {
        let mut credentials = self.get()?;
        credentials.clear_session();
        self.save(&credentials)
    }
}

impl<T> CredentialStore for Arc<T>
where
    T: CredentialStore + ?Sized,
{
    fn get(&self) -> Result<Credentials, SessionError> {
        (**self).get()
    }

    fn save(&self, credentials: &Credentials) -> Result<(), SessionError> {
        (**self).save(credentials)
    }

    fn clear_session(&self) -> Result<(), SessionError> {
        (**self).clear_session()
    }
}

/// A [`CredentialStore`] that keeps the credentials in memory.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<Credentials>,
}

impl MemoryCredentialStore {
    /// Creates a store holding `credentials`.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Mutex::new(credentials),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Credentials, SessionError> {
        let guard = self
            .credentials
            .lock()
            .map_err(|_| SessionError::Poisoned)?;
        Ok(guard.clone())
    }

    fn save(&self, credentials: &Credentials) -> Result<(), SessionError> {
        let mut guard = self
            .credentials
            .lock()
            .map_err(|_| SessionError::Poisoned)?;
        guard.clone_from(credentials);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logged_in() -> Credentials {
        Credentials {
            target: "https://api.example.com".to_owned(),
            api_version: "2.0.0".to_owned(),
            authorization_endpoint: "https://login.example.com".to_owned(),
            access_token: "BEARER my_access_token".into(),
            refresh_token: "my_refresh_token".into(),
            organization: Some(Organization {
                guid: "org-guid".to_owned(),
                name: "my-org".to_owned(),
            }),
            space: Some(Space {
                guid: "space-guid".to_owned(),
                name: "dev".to_owned(),
            }),
        }
    }

    #[test]
    fn should_report_logged_in_from_access_token() {
        assert!(logged_in().is_logged_in());
        assert!(!Credentials::for_target("https://api.example.com").is_logged_in());
    }

    #[test]
    fn should_clear_session_but_keep_target() {
        let mut credentials = logged_in();

        credentials.clear_session();

        assert_eq!(credentials, Credentials::for_target("https://api.example.com"));
        assert!(!credentials.has_organization());
        assert!(!credentials.has_space());
    }

    #[test]
    fn should_save_and_get_from_memory_store() -> Result<(), SessionError> {
        let store = MemoryCredentialStore::default();

        store.save(&logged_in())?;

        assert_eq!(store.get()?, logged_in());
        Ok(())
    }

    #[test]
    fn should_clear_session_through_shared_store() -> Result<(), SessionError> {
        let store = Arc::new(MemoryCredentialStore::new(logged_in()));
        let handle = Arc::clone(&store);

        handle.clear_session()?;

        let credentials = store.get()?;
        assert!(!credentials.is_logged_in());
        assert!(credentials.refresh_token.is_empty());
        assert_eq!(credentials.target, "https://api.example.com");
        Ok(())
    }

    #[test]
    fn should_not_leak_tokens_in_debug() {
        let debug = format!("{:?}", logged_in());

        assert!(!debug.contains("my_access_token"));
        assert!(!debug.contains("my_refresh_token"));
    }

    #[test]
    fn should_deserialize_partial_credentials() -> anyhow::Result<()> {
        let credentials: Credentials =
            serde_json::from_str(r#"{"target":"https://api.example.com"}"#)?;

        assert_eq!(credentials, Credentials::for_target("https://api.example.com"));
        Ok(())
    }
}
