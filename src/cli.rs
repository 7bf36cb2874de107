use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "storechat")]
#[command(about = "Chat with documents in Gemini file search stores")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, overriding backend.base_url
    #[arg(short, long, global = true)]
    pub server: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Start the interactive chat interface (default)
    Chat {
        /// Store to select on startup
        #[arg(long)]
        store: Option<String>,
    },

    /// Ask a single question and print the answer with citations and usage
    Ask {
        /// The question
        query: String,

        /// Store to search, e.g. fileSearchStores/abc123
        #[arg(long)]
        store: Option<String>,
    },

    /// List the stores the backend can see
    Stores,

    /// Manage the Gemini API key
    ApiKey {
        #[command(subcommand)]
        action: ApiKeyAction,
    },

    /// Run the REST backend that proxies to Gemini
    Serve {
        /// Address to listen on, overriding server.bind
        #[arg(short, long)]
        bind: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ApiKeyAction {
    /// Send a key to the backend
    Set {
        key: String,

        /// Also keep the key in the OS keyring
        #[arg(long)]
        remember: bool,
    },
    /// Show whether a key is remembered
    Status,
    /// Delete the remembered key
    Forget,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Chat { store: None })
    }
}
