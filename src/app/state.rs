use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::client::{ApiClient, ChatBackend};
use crate::api::types::ApiKeyAck;
use crate::app::config::AppConfig;
use crate::error::Result;
use crate::platform::SecureStorageManager;

/// Everything a front-end session shares.
pub struct AppState {
    config: AppConfig,
    secure_storage: SecureStorageManager,
    backend: Arc<dyn ChatBackend>,
}

impl AppState {
    pub fn new(config: AppConfig, secure_storage: SecureStorageManager) -> Result<Self> {
        info!("Initializing application state");
        let backend = Arc::new(ApiClient::new(&config.backend)?);
        Ok(Self::with_backend(config, secure_storage, backend))
    }

    pub fn with_backend(
        config: AppConfig,
        secure_storage: SecureStorageManager,
        backend: Arc<dyn ChatBackend>,
    ) -> Self {
        Self {
            config,
            secure_storage,
            backend,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn backend(&self) -> Arc<dyn ChatBackend> {
        self.backend.clone()
    }

    /// Sends the key to the backend and, when accepted and `remember` is set,
    /// keeps it in secure storage.
    pub async fn configure_api_key(&self, api_key: &str, remember: bool) -> Result<ApiKeyAck> {
        let ack = self.backend.configure_api_key(api_key).await?;
        if ack.success && remember {
            self.secure_storage.store_api_key(api_key).await?;
            info!("API key remembered");
        }
        Ok(ack)
    }

    pub async fn remembered_api_key(&self) -> Result<Option<String>> {
        self.secure_storage.retrieve_api_key().await
    }

    pub async fn forget_api_key(&self) -> Result<()> {
        self.secure_storage.delete_api_key().await
    }

    /// Pushes a remembered key to the backend. `Ok(None)` when nothing is
    /// remembered.
    pub async fn sync_remembered_key(&self) -> Result<Option<ApiKeyAck>> {
        let Some(key) = self.remembered_api_key().await? else {
            debug!("No remembered API key to push");
            return Ok(None);
        };

        let ack = self.backend.configure_api_key(&key).await?;
        if !ack.success {
            warn!("Backend rejected the remembered API key: {}", ack.message);
        }
        Ok(Some(ack))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{ChatReply, ChatRequest, StoreSummary};
    use crate::platform::MemoryStorage;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct KeyCheckingBackend {
        valid_key: &'static str,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatBackend for KeyCheckingBackend {
        async fn chat(&self, _request: &ChatRequest) -> Result<ChatReply> {
            Ok(ChatReply::default())
        }

        async fn list_stores(&self) -> Result<Vec<StoreSummary>> {
            Ok(Vec::new())
        }

        async fn configure_api_key(&self, api_key: &str) -> Result<ApiKeyAck> {
            self.seen.lock().push(api_key.to_string());
            let success = api_key == self.valid_key;
            Ok(ApiKeyAck {
                success,
                message: if success { "ok" } else { "Invalid API key" }.to_string(),
            })
        }
    }

    fn state(backend: Arc<KeyCheckingBackend>) -> AppState {
        AppState::with_backend(
            AppConfig::default(),
            SecureStorageManager::with_backend(Box::new(MemoryStorage::default())),
            backend,
        )
    }

    #[tokio::test]
    async fn test_rejected_key_is_not_remembered() {
        let backend = Arc::new(KeyCheckingBackend {
            valid_key: "good",
            seen: Mutex::new(Vec::new()),
        });
        let state = state(backend.clone());

        let ack = state.configure_api_key("bad", true).await.unwrap();
        assert!(!ack.success);
        assert_eq!(state.remembered_api_key().await.unwrap(), None);

        let ack = state.configure_api_key("good", true).await.unwrap();
        assert!(ack.success);
        assert_eq!(state.remembered_api_key().await.unwrap(), Some("good".to_string()));
    }

    #[tokio::test]
    async fn test_sync_remembered_key() {
        let backend = Arc::new(KeyCheckingBackend {
            valid_key: "good",
            seen: Mutex::new(Vec::new()),
        });
        let state = state(backend.clone());

        assert!(state.sync_remembered_key().await.unwrap().is_none());
        assert!(backend.seen.lock().is_empty());

        state.configure_api_key("good", true).await.unwrap();
        let ack = state.sync_remembered_key().await.unwrap().unwrap();
        assert!(ack.success);
        assert_eq!(backend.seen.lock().as_slice(), ["good", "good"]);

        state.forget_api_key().await.unwrap();
        assert!(state.sync_remembered_key().await.unwrap().is_none());
    }
}
