pub mod config;
pub mod state;

pub use config::{AppConfig, BackendConfig, ServerConfig, UIConfig};
pub use state::AppState;
