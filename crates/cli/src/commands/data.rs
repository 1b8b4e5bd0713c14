//! Backup and storage maintenance command handlers.

use std::path::PathBuf;

use eyre::{Result, WrapErr};
use reader_session::ReaderSession;
use tracing::info;

use super::confirm;
use crate::cli::DataCommands;
use crate::config::Config;

pub async fn handle_data_command(
    cmd: DataCommands,
    session: &mut ReaderSession,
    config: &Config,
    dry_run: bool,
) -> Result<()> {
    match cmd {
        DataCommands::Export { dir } => handle_export(dir, session, config, dry_run).await,
        DataCommands::Import { file } => handle_import(file, session, dry_run).await,
        DataCommands::Info => handle_info(session).await,
        DataCommands::ClearSettings { force } => {
            handle_clear_settings(force, session, dry_run).await
        }
    }
}

async fn handle_export(
    dir: Option<PathBuf>,
    session: &ReaderSession,
    config: &Config,
    dry_run: bool,
) -> Result<()> {
    let dir = dir
        .or_else(|| config.export.output_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    if dry_run {
        let novels = session.storage().list_all_novels().await.len();
        println!("Would export {} novels to {}", novels, dir.display());
        return Ok(());
    }

    let path = session
        .storage()
        .export_to_dir(&dir)
        .await
        .wrap_err("Failed to export data")?;
    println!("✅ Backup written to {}", path.display());
    Ok(())
}

async fn handle_import(file: PathBuf, session: &mut ReaderSession, dry_run: bool) -> Result<()> {
    if dry_run {
        println!("Would import backup {}", file.display());
        return Ok(());
    }

    let imported = session
        .storage()
        .import_file(&file)
        .await
        .wrap_err_with(|| format!("Failed to import {}", file.display()))?;
    session.load_preferences().await;
    info!(imported, file = %file.display(), "imported backup");
    println!("✅ Imported {} novels", imported);
    Ok(())
}

async fn handle_info(session: &ReaderSession) -> Result<()> {
    let info = session.storage().storage_info().await;
    let novels = session.storage().list_all_novels().await;

    println!("Storage:");
    println!("  used: {}", info.formatted_size);
    println!("  local entries: {}", info.items_count);
    println!("  novels: {}", novels.len());
    Ok(())
}

async fn handle_clear_settings(
    force: bool,
    session: &mut ReaderSession,
    dry_run: bool,
) -> Result<()> {
    if dry_run {
        println!("Would remove settings and the custom font");
        return Ok(());
    }

    if !force && !confirm("Remove all settings and the custom font?")? {
        println!("❌ Cancelled");
        return Ok(());
    }

    session.storage().delete_all_settings().await?;
    session.load_preferences().await;
    println!("✅ Settings cleared");
    Ok(())
}
