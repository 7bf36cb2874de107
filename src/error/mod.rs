use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Backend API error: {0}")]
    Api(String),

    #[error("Upstream API error {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Server error: {0}")]
    Server(String),

    #[error("Secure storage error: {0}")]
    SecureStorage(#[from] keyring::Error),
}

impl Error {
    pub fn platform(msg: impl Into<String>) -> Self {
        Error::Platform(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn api(msg: impl Into<String>) -> Self {
        Error::Api(msg.into())
    }

    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Error::Upstream {
            status,
            body: body.into(),
        }
    }

    pub fn server(msg: impl Into<String>) -> Self {
        Error::Server(msg.into())
    }
}
