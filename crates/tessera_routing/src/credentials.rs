//! Backend credentials supplied through process configuration.

use std::collections::HashMap;
use tessera_core::{CredentialRef, Secret};
use tessera_error::ConfigError;
use tracing::debug;

/// Snapshot of key/value credential configuration.
///
/// Lookup happens when a request is dispatched, so a missing key only fails
/// the requests that need it.
///
/// # Examples
///
/// ```
/// use tessera_core::CredentialRef;
/// use tessera_routing::Credentials;
///
/// let credentials = Credentials::default().with("GROQ_API_KEY", "gsk-test");
/// assert!(credentials.resolve(&CredentialRef::new("GROQ_API_KEY")).is_ok());
/// assert!(credentials.resolve(&CredentialRef::new("OPENAI_API_KEY")).is_err());
/// ```
#[derive(Clone, Default)]
pub struct Credentials {
    values: HashMap<String, Secret>,
}

impl Credentials {
    /// Capture the current process environment.
    pub fn from_env() -> Self {
        Self::from_pairs(std::env::vars())
    }

    /// Build from explicit key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Secret::new(v)))
            .collect();
        Self { values }
    }

    /// Add or replace one credential.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), Secret::new(value));
        self
    }

    /// Resolve a credential reference.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the key is absent or empty.
    pub fn resolve(&self, credential: &CredentialRef) -> Result<Secret, ConfigError> {
        match self.values.get(credential.key()) {
            Some(secret) if !secret.expose().trim().is_empty() => Ok(secret.clone()),
            _ => {
                debug!(key = credential.key(), "Credential not configured");
                Err(ConfigError::new(format!(
                    "credential {} is not configured",
                    credential.key()
                )))
            }
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("Credentials").field("keys", &keys).finish()
    }
}
