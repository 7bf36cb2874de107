use async_trait::async_trait;
use keyring::Entry;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::{Error, Result};

const API_KEY_SERVICE: &str = "dev.storechat.api_keys";
const GEMINI_ACCOUNT: &str = "gemini";

#[async_trait]
pub trait SecureStorage: Send + Sync {
    async fn store(&self, service: &str, key: &str, value: &str) -> Result<()>;
    async fn retrieve(&self, service: &str, key: &str) -> Result<Option<String>>;
    async fn delete(&self, service: &str, key: &str) -> Result<()>;
}

/// Remembers the Gemini API key between sessions.
pub struct SecureStorageManager {
    backend: Box<dyn SecureStorage>,
}

impl SecureStorageManager {
    pub fn new() -> Result<Self> {
        Ok(Self::with_backend(Box::new(KeyringStorage)))
    }

    pub fn with_backend(backend: Box<dyn SecureStorage>) -> Self {
        Self { backend }
    }

    pub async fn store_api_key(&self, key: &str) -> Result<()> {
        debug!("Storing Gemini API key");

        let result = self.backend.store(API_KEY_SERVICE, GEMINI_ACCOUNT, key).await;
        if result.is_err() {
            warn!("Failed to store Gemini API key");
        }
        result
    }

    pub async fn retrieve_api_key(&self) -> Result<Option<String>> {
        let result = self.backend.retrieve(API_KEY_SERVICE, GEMINI_ACCOUNT).await;
        match &result {
            Ok(Some(_)) => debug!("Found remembered Gemini API key"),
            Ok(None) => debug!("No remembered Gemini API key"),
            Err(e) => warn!("Failed to read Gemini API key: {}", e),
        }
        result
    }

    pub async fn delete_api_key(&self) -> Result<()> {
        debug!("Deleting Gemini API key");
        self.backend.delete(API_KEY_SERVICE, GEMINI_ACCOUNT).await
    }
}

pub struct KeyringStorage;

#[async_trait]
impl SecureStorage for KeyringStorage {
    async fn store(&self, service: &str, key: &str, value: &str) -> Result<()> {
        let entry = Entry::new(service, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    async fn retrieve(&self, service: &str, key: &str) -> Result<Option<String>> {
        let entry = Entry::new(service, key)?;
        match entry.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::SecureStorage(e)),
        }
    }

    async fn delete(&self, service: &str, key: &str) -> Result<()> {
        let entry = Entry::new(service, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::SecureStorage(e)),
        }
    }
}

/// Process-local storage for environments without a keychain.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<(String, String), String>>,
}

#[async_trait]
impl SecureStorage for MemoryStorage {
    async fn store(&self, service: &str, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .insert((service.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    async fn retrieve(&self, service: &str, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .get(&(service.to_string(), key.to_string()))
            .cloned())
    }

    async fn delete(&self, service: &str, key: &str) -> Result<()> {
        self.entries
            .lock()
            .remove(&(service.to_string(), key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_key_roundtrip() {
        let storage = SecureStorageManager::with_backend(Box::new(MemoryStorage::default()));

        assert_eq!(storage.retrieve_api_key().await.unwrap(), None);

        storage.store_api_key("AIza-test-123").await.unwrap();
        assert_eq!(
            storage.retrieve_api_key().await.unwrap(),
            Some("AIza-test-123".to_string())
        );

        storage.delete_api_key().await.unwrap();
        assert_eq!(storage.retrieve_api_key().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_ok() {
        let storage = SecureStorageManager::with_backend(Box::new(MemoryStorage::default()));
        assert!(storage.delete_api_key().await.is_ok());
    }
}
