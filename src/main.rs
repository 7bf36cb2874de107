mod cli;
mod logging;
mod tui;

use anyhow::{bail, Context};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use storechat::app::{AppConfig, AppState};
use storechat::chat::{render_plain, run_turn, ChatPanel};
use storechat::platform::{AppPaths, SecureStorageManager};
use storechat::stores::format_size;

use cli::{ApiKeyAction, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command();

    let paths = AppPaths::new()?;
    paths.ensure_dirs_exist()?;

    let _log_guard = logging::init(&paths, cli.debug, matches!(command, Commands::Chat { .. }));
    info!("Starting StoreChat {}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load(&paths, cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    if let Some(server) = cli.server {
        config.backend.base_url = server;
        config.validate()?;
    }

    let default_store = config.ui.default_store.clone();

    match command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
                config.validate()?;
            }
            storechat::server::serve(&config.server).await?;
        }
        Commands::Chat { store } => tui::run(build_state(config)?, store).await?,
        Commands::Ask { query, store } => {
            let state = build_state(config)?;
            let store = store.or(default_store);
            let backend = state.backend();
            let mut panel = ChatPanel::new();
            run_turn(&mut panel, backend.as_ref(), &query, store.as_deref()).await?;
            print!("{}", render_plain(&panel.view()));
        }
        Commands::Stores => {
            let state = build_state(config)?;
            let stores = state.backend().list_stores().await?;
            if stores.is_empty() {
                println!("No stores found.");
            }
            for store in stores {
                println!("{}", store.name);
                println!(
                    "  {} | {} active, {} pending, {} failed | {}",
                    store.label(),
                    store.active_documents_count,
                    store.pending_documents_count,
                    store.failed_documents_count,
                    format_size(store.size_bytes)
                );
            }
        }
        Commands::ApiKey { action } => {
            let state = build_state(config)?;
            match action {
                ApiKeyAction::Set { key, remember } => {
                    let ack = state.configure_api_key(&key, remember).await?;
                    if !ack.success {
                        bail!("{}", ack.message);
                    }
                    println!("{}", ack.message);
                    if remember {
                        println!("Key remembered in the OS keyring.");
                    }
                }
                ApiKeyAction::Status => match state.remembered_api_key().await? {
                    Some(key) => println!("A key is remembered (ends in ...{}).", key_suffix(&key)),
                    None => println!("No key is remembered."),
                },
                ApiKeyAction::Forget => {
                    state.forget_api_key().await?;
                    println!("Remembered key deleted.");
                }
            }
        }
    }

    Ok(())
}

fn build_state(config: AppConfig) -> anyhow::Result<Arc<AppState>> {
    let secure_storage = SecureStorageManager::new()?;
    Ok(Arc::new(AppState::new(config, secure_storage)?))
}

fn key_suffix(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    chars[chars.len().saturating_sub(4)..].iter().collect()
}
