mod cli;
mod commands;
mod config;

use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use reader_session::ReaderSession;
use reader_storage::{FilesystemIndexedStore, LocalStore, StorageManager};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::{
    handle_config_command, handle_data_command, handle_font_command, handle_library_command,
    handle_open_command, handle_read_command, handle_settings_command,
};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Commands::Config { command } = cli.command {
        return handle_config_command(command, cli.dry_run).await;
    }

    let config = Config::load().await.context("Failed to load configuration")?;
    let storage_path = cli
        .storage_path
        .clone()
        .unwrap_or_else(|| config.storage_path());

    let small = LocalStore::open(storage_path.join("local.json"), config.storage.small_capacity)
        .context("Failed to open local storage")?;
    let large = FilesystemIndexedStore::new(storage_path.join("indexed"));
    let storage = Arc::new(
        StorageManager::open(Arc::new(small), Arc::new(large))
            .await
            .with_policy(config.routing_policy()),
    );

    let mut session = ReaderSession::new(storage).with_options(config.session_options());
    session.load_preferences().await;

    let result = match cli.command {
        Commands::Open { file, preview } => handle_open_command(file, preview, &mut session).await,
        Commands::Library { command } => {
            handle_library_command(command, &mut session, cli.dry_run).await
        }
        Commands::Read {
            novel_id,
            chapter,
            next,
            prev,
        } => handle_read_command(novel_id, chapter, next, prev, &mut session).await,
        Commands::Settings { command } => {
            handle_settings_command(command, &mut session, cli.dry_run).await
        }
        Commands::Font { command } => handle_font_command(command, &mut session, cli.dry_run).await,
        Commands::Data { command } => {
            handle_data_command(command, &mut session, &config, cli.dry_run).await
        }
        Commands::Config { .. } => unreachable!("config commands are handled before storage opens"),
    };

    session
        .close()
        .await
        .context("Failed to save reader state")?;
    result
}
