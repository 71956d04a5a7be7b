//! Credential holder: the bearer token for the remote endpoint.
//!
//! The key is kept in the session store only. Its shape is never validated
//! (providers change key formats), but a blank key is refused.

use crate::error::StudyError;
use crate::storage::SessionStore;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Session-storage key under which the credential is kept.
pub const CREDENTIAL_KEY: &str = "openai_api_key_session";

/// An opaque, non-empty bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Trim and wrap `raw`; blank input is rejected.
    pub fn new(raw: &str) -> Result<Self, StudyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StudyError::EmptyCredential);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The raw secret. Only used to build the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Stores and retrieves the credential in process-scoped storage.
pub struct CredentialHolder {
    store: Arc<dyn SessionStore>,
}

impl CredentialHolder {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Save a new key, replacing any previous one.
    pub fn save(&self, raw: &str) -> Result<(), StudyError> {
        let credential = Credential::new(raw)?;
        self.store.set(CREDENTIAL_KEY, credential.0);
        info!("API key saved for this session");
        Ok(())
    }

    pub fn get(&self) -> Option<Credential> {
        self.store
            .get(CREDENTIAL_KEY)
            .and_then(|raw| Credential::new(&raw).ok())
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }

    pub fn clear(&self) {
        self.store.remove(CREDENTIAL_KEY);
        info!("API key cleared");
    }

    pub fn status_line(&self) -> &'static str {
        if self.is_set() {
            "Key ready (session only)."
        } else {
            "No key. Save one with `key <API_KEY>`."
        }
    }
}
