//! OS keychain access for the model API key.
//!
//! Wraps the keyring crate so the key never has to live in the config file.

use thiserror::Error;

/// Errors raised by keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Keychain task failed: {0}")]
    TaskFailed(String),
}

/// Result type for keychain operations.
pub type Result<T> = std::result::Result<T, KeychainError>;

/// Credential store scoped to one keychain service name.
#[derive(Debug, Clone)]
pub struct KeychainAccess {
    service_name: String,
}

impl KeychainAccess {
    /// Service name used outside of tests.
    pub const DEFAULT_SERVICE: &'static str = "io.inbox-triage";

    pub fn new() -> Self {
        Self::with_service(Self::DEFAULT_SERVICE)
    }

    /// Uses a custom service name, e.g. to keep tests away from real entries.
    pub fn with_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Stores a secret, overwriting any previous value.
    pub async fn store(&self, key: &str, value: &str) -> Result<()> {
        let service = self.service_name.clone();
        let key = key.to_string();
        let value = value.to_string();

        tokio::task::spawn_blocking(move || {
            keyring::Entry::new(&service, &key)?.set_password(&value)?;
            Ok(())
        })
        .await
        .map_err(|e| KeychainError::TaskFailed(e.to_string()))?
    }

    /// Reads a secret, `None` when nothing is stored under the key.
    pub async fn retrieve(&self, key: &str) -> Result<Option<String>> {
        let service = self.service_name.clone();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || {
            match keyring::Entry::new(&service, &key)?.get_password() {
                Ok(secret) => Ok(Some(secret)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(KeychainError::Keyring(e)),
            }
        })
        .await
        .map_err(|e| KeychainError::TaskFailed(e.to_string()))?
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Keychain key under which a provider's API key is stored.
    pub fn api_key_entry(provider: &str) -> String {
        format!("ai.api_key.{}", provider)
    }
}

impl Default for KeychainAccess {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_service_name() {
        assert_eq!(
            KeychainAccess::default().service_name(),
            KeychainAccess::DEFAULT_SERVICE
        );
    }

    #[test]
    fn custom_service_name() {
        let keychain = KeychainAccess::with_service("test.service");
        assert_eq!(keychain.service_name(), "test.service");
    }

    #[test]
    fn api_key_entry_format() {
        assert_eq!(KeychainAccess::api_key_entry("openai"), "ai.api_key.openai");
    }

    // Touches the real OS keychain, so it only builds with the feature on.
    // cargo test --features keychain-integration-tests -- --ignored
    #[cfg(feature = "keychain-integration-tests")]
    mod integration {
        use super::*;

        #[tokio::test]
        #[ignore = "requires OS keychain access"]
        async fn store_overwrites_previous_value() {
            let keychain = KeychainAccess::with_service("io.inbox-triage.test");
            let key = KeychainAccess::api_key_entry("test");

            keychain.store(&key, "sk-first").await.unwrap();
            assert_eq!(keychain.retrieve(&key).await.unwrap(), Some("sk-first".to_string()));

            keychain.store(&key, "sk-second").await.unwrap();
            assert_eq!(keychain.retrieve(&key).await.unwrap(), Some("sk-second".to_string()));
        }

        #[tokio::test]
        #[ignore = "requires OS keychain access"]
        async fn missing_entry_reads_as_none() {
            let keychain = KeychainAccess::with_service("io.inbox-triage.test");
            let key = KeychainAccess::api_key_entry("never-stored");
            assert_eq!(keychain.retrieve(&key).await.unwrap(), None);
        }
    }
}
