use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::platform::AppPaths;

const ENV_PREFIX: &str = "STORECHAT";
const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub server: ServerConfig,
    pub ui: UIConfig,
}

/// Where the front-end finds the StoreChat REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// No timeout unless set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

/// The proxy started by `storechat serve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub gemini_base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UIConfig {
    pub theme: String,
    pub tick_rate_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_store: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5002".to_string(),
            timeout_seconds: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5002".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.4,
            top_p: 1.0,
            top_k: 32,
            max_output_tokens: 4096,
            api_key: None,
        }
    }
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            tick_rate_ms: 250,
            default_store: None,
        }
    }
}

impl AppConfig {
    /// Loads `override_path` if given, else the platform config file, writing
    /// a default one on first run.
    pub async fn load(paths: &AppPaths, override_path: Option<&Path>) -> Result<Self> {
        let config_file = match override_path {
            Some(path) => path.to_path_buf(),
            None => {
                let default_file = paths.config_file();
                if !default_file.exists() {
                    info!("Config file not found, creating default configuration");
                    Self::default().save_to(&default_file).await?;
                }
                default_file
            }
        };

        info!("Loading configuration from: {:?}", config_file);
        Self::load_from(&config_file)
    }

    /// Defaults, then the TOML file (if present), then `STORECHAT_*`
    /// environment variables, then `GEMINI_API_KEY`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = settings.try_deserialize()?;

        if config.server.api_key.as_deref().map_or(true, str::is_empty) {
            config.server.api_key = std::env::var(GEMINI_KEY_VAR).ok().filter(|k| !k.is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        info!("Saving configuration to: {:?}", path);

        let config_content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(config::ConfigError::Message(e.to_string())))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, config_content).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.backend.base_url)
            .map_err(|e| Error::validation(format!("backend.base_url is not a URL: {}", e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::validation("backend.base_url must be http or https"));
        }
        if self.backend.timeout_seconds == Some(0) {
            return Err(Error::validation("backend.timeout_seconds must be positive"));
        }

        self.server
            .bind
            .parse::<SocketAddr>()
            .map_err(|e| Error::validation(format!("server.bind is not a socket address: {}", e)))?;
        Url::parse(&self.server.gemini_base_url)
            .map_err(|e| Error::validation(format!("server.gemini_base_url is not a URL: {}", e)))?;
        if self.server.model.is_empty() {
            return Err(Error::validation("server.model must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.server.temperature) {
            return Err(Error::validation("server.temperature must be between 0 and 2"));
        }
        if !(0.0..=1.0).contains(&self.server.top_p) {
            return Err(Error::validation("server.top_p must be between 0 and 1"));
        }
        if self.server.max_output_tokens == 0 {
            return Err(Error::validation("server.max_output_tokens must be positive"));
        }

        if !matches!(self.ui.theme.as_str(), "dark" | "light") {
            warn!("Unknown theme '{}', falling back to dark", self.ui.theme);
        }
        if self.ui.tick_rate_ms == 0 {
            return Err(Error::validation("ui.tick_rate_ms must be positive"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend.base_url, "http://127.0.0.1:5002");
        assert_eq!(config.backend.timeout_seconds, None);
        assert_eq!(config.server.model, "gemini-2.5-flash");
        assert_eq!(config.server.top_k, 32);
        assert_eq!(config.server.max_output_tokens, 4096);
        assert_eq!(config.ui.theme, "dark");
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.backend.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.bind = "localhost".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.backend.timeout_seconds = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:5002");
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[backend]\nbase_url = \"http://10.0.0.5:8080\"\ntimeout_seconds = 30\n\n[server]\nmodel = \"gemini-2.5-pro\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.backend.base_url, "http://10.0.0.5:8080");
        assert_eq!(config.backend.timeout_seconds, Some(30));
        assert_eq!(config.server.model, "gemini-2.5-pro");
        assert_eq!(config.server.top_k, 32);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend]\nbase_url = \"nope\"\n").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_environment_override() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("STORECHAT_UI__DEFAULT_STORE", "fileSearchStores/from-env");
        let config = AppConfig::load_from(&dir.path().join("absent.toml"));
        std::env::remove_var("STORECHAT_UI__DEFAULT_STORE");

        assert_eq!(
            config.unwrap().ui.default_store.as_deref(),
            Some("fileSearchStores/from-env")
        );
    }

    #[tokio::test]
    async fn test_first_run_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = AppPaths::rooted_at(dir.path());

        let config = AppConfig::load(&paths, None).await.unwrap();
        assert!(paths.config_file().exists());

        let written = std::fs::read_to_string(paths.config_file()).unwrap();
        assert!(written.contains("base_url"));
        assert!(!written.contains("api_key"));
        assert_eq!(config.ui.tick_rate_ms, 250);
    }
}
