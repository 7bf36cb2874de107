use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::api::types::{ApiKeyAck, ApiKeyRequest, ChatReply, ChatRequest, StoreSummary};
use crate::app::config::BackendConfig;
use crate::error::{Error, Result};

/// What the front-end needs from the backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply>;
    async fn list_stores(&self) -> Result<Vec<StoreSummary>>;
    async fn configure_api_key(&self, api_key: &str) -> Result<ApiKeyAck>;
}

/// reqwest client for the StoreChat REST API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder
            .build()
            .map_err(|e| Error::api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: Self::normalize_base(&config.base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // Url::join drops the last path segment unless it ends with '/'.
    fn normalize_base(raw: &str) -> Result<Url> {
        let mut url = Url::parse(raw)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Decodes the body as JSON whatever the status code is: the backend
    /// reports failures inside a 200 body, and a non-JSON body is a transport
    /// problem either way.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!("Backend answered {}: {}", status, body);
        }
        serde_json::from_str(&body).map_err(|e| {
            Error::api(format!("Unreadable response (HTTP {}): {}", status.as_u16(), e))
        })
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        let url = self.endpoint("api/chat")?;
        debug!("POST {} ({} store(s))", url, request.store_names.len());

        let response = self.client.post(url).json(request).send().await?;
        Self::decode(response).await
    }

    async fn list_stores(&self) -> Result<Vec<StoreSummary>> {
        let url = self.endpoint("api/stores")?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    async fn configure_api_key(&self, api_key: &str) -> Result<ApiKeyAck> {
        let url = self.endpoint("api/configure-api-key")?;
        debug!("POST {}", url);

        let body = ApiKeyRequest {
            api_key: api_key.to_string(),
        };
        let response = self.client.post(url).json(&body).send().await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(&BackendConfig {
            base_url: base_url.to_string(),
            timeout_seconds: None,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joining() {
        let api = client("http://127.0.0.1:5002");
        assert_eq!(
            api.endpoint("api/chat").unwrap().as_str(),
            "http://127.0.0.1:5002/api/chat"
        );

        let prefixed = client("https://example.com/storechat");
        assert_eq!(
            prefixed.endpoint("/api/stores").unwrap().as_str(),
            "https://example.com/storechat/api/stores"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ApiClient::new(&BackendConfig {
            base_url: "not a url".to_string(),
            timeout_seconds: Some(5),
        });
        assert!(matches!(result, Err(Error::Url(_))));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_an_error() {
        // Port 9 (discard) is closed on loopback in test environments.
        let api = client("http://127.0.0.1:9");
        let result = api.chat(&ChatRequest::for_store("hi", "fileSearchStores/a")).await;
        assert!(result.is_err());
    }
}
