pub mod api;
pub mod app;
pub mod chat;
pub mod error;
pub mod platform;
pub mod server;
pub mod stores;

pub use error::{Error, Result};
