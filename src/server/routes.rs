use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::api::types::{ApiKeyAck, ApiKeyRequest, ChatReply, ChatRequest, StoreSummary};
use crate::error::Error;
use crate::server::gemini::FileSearchClient;

/// Shared by every handler. The key sits behind a lock because
/// `/api/configure-api-key` swaps it at runtime.
#[derive(Clone)]
pub struct ServerState {
    gemini: Arc<FileSearchClient>,
    api_key: Arc<RwLock<Option<String>>>,
}

impl ServerState {
    pub fn new(gemini: FileSearchClient, api_key: Option<String>) -> Self {
        Self {
            gemini: Arc::new(gemini),
            api_key: Arc::new(RwLock::new(api_key.filter(|k| !k.is_empty()))),
        }
    }

    fn api_key(&self) -> Option<String> {
        self.api_key.read().clone()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.read().is_some()
    }
}

/// `POST /api/chat`. Always answers 200; failures travel in `error`.
pub async fn chat(
    State(state): State<ServerState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ChatReply> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected chat body: {}", rejection.body_text());
            return Json(ChatReply::failure(rejection.body_text()));
        }
    };
    if request.query.is_empty() {
        return Json(ChatReply::failure("Query is required"));
    }
    let Some(api_key) = state.api_key() else {
        return Json(ChatReply::failure("API key not configured"));
    };

    match state
        .gemini
        .generate(&api_key, &request.query, &request.store_names)
        .await
    {
        Ok(reply) => Json(reply),
        Err(Error::Upstream { body, .. }) => {
            Json(ChatReply::failure(format!("API request failed: {}", body)))
        }
        Err(e) => {
            error!("Chat request failed: {}", e);
            Json(ChatReply::failure(e.to_string()))
        }
    }
}

/// `GET /api/stores`. Any failure yields an empty list.
pub async fn list_stores(State(state): State<ServerState>) -> Json<Vec<StoreSummary>> {
    let Some(api_key) = state.api_key() else {
        warn!("Store listing requested without an API key");
        return Json(Vec::new());
    };

    match state.gemini.list_stores(&api_key).await {
        Ok(stores) => Json(stores),
        Err(e) => {
            error!("Error listing file search stores: {}", e);
            Json(Vec::new())
        }
    }
}

/// `POST /api/configure-api-key`. The key is replaced only when Gemini
/// accepts it.
pub async fn configure_api_key(
    State(state): State<ServerState>,
    payload: std::result::Result<Json<ApiKeyRequest>, JsonRejection>,
) -> Json<ApiKeyAck> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    if request.api_key.is_empty() || !state.gemini.validate_key(&request.api_key).await {
        return Json(ApiKeyAck {
            success: false,
            message: "Invalid API key".to_string(),
        });
    }

    *state.api_key.write() = Some(request.api_key);
    info!("API key configured");
    Json(ApiKeyAck {
        success: true,
        message: "API key configured successfully".to_string(),
    })
}
