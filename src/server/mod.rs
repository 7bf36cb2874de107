//! The `storechat serve` proxy: a small axum service that holds the Gemini
//! key and answers the REST endpoints the front-ends talk to.

pub mod gemini;
pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::app::config::ServerConfig;
use crate::error::Result;

pub use gemini::FileSearchClient;
pub use routes::ServerState;

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/chat", post(routes::chat))
        .route("/api/stores", get(routes::list_stores))
        .route("/api/configure-api-key", post(routes::configure_api_key))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `config.bind` and serves until the process is stopped.
pub async fn serve(config: &ServerConfig) -> Result<()> {
    let state = ServerState::new(FileSearchClient::new(config)?, config.api_key.clone());
    if !state.has_api_key() {
        warn!("No Gemini API key configured; chat requests will fail until one is set");
    }

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("StoreChat server listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
