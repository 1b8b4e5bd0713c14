//! `config` subcommands. These run before storage is opened.

use eyre::{Result, WrapErr};

use super::confirm;
use crate::cli::ConfigCommands;
use crate::config::Config;

pub async fn handle_config_command(cmd: ConfigCommands, dry_run: bool) -> Result<()> {
    let config = Config::load().await.wrap_err("Failed to load configuration")?;
    match cmd {
        ConfigCommands::Set { key, value } => handle_set(config, &key, &value, dry_run).await,
        ConfigCommands::Get { key } => {
            println!("{}", config.get_value(&key)?);
            Ok(())
        }
        ConfigCommands::Show => {
            print_config(&config);
            Ok(())
        }
        ConfigCommands::Reset { force } => handle_reset(&config, force, dry_run).await,
    }
}

async fn handle_set(mut config: Config, key: &str, value: &str, dry_run: bool) -> Result<()> {
    let previous = config.get_value(key)?;
    config.set_value(key, value)?;
    let current = config.get_value(key)?;

    if previous == current {
        println!("{} is already {}", key, current);
        return Ok(());
    }
    if dry_run {
        println!("Would change {}: {} -> {}", key, previous, current);
        return Ok(());
    }

    config.save().await.wrap_err("Failed to save configuration")?;
    println!("✅ {}: {} -> {}", key, previous, current);
    if key == "storage.path" {
        println!("💡 Stored novels are not moved; use 'novel-reader data export' first");
    }
    Ok(())
}

fn print_config(config: &Config) {
    println!("{}", config.show_all());
    println!("\nIn effect:\n{}", config.effective_summary());
    println!("\nConfig file: {}", Config::get_config_path().display());
}

async fn handle_reset(config: &Config, force: bool, dry_run: bool) -> Result<()> {
    if *config == Config::default() {
        println!("Configuration already uses the defaults");
        return Ok(());
    }
    if dry_run {
        println!("Would reset configuration to defaults");
        return Ok(());
    }
    if !force && !confirm("Reset all configuration to defaults?")? {
        println!("❌ Cancelled");
        return Ok(());
    }

    Config::reset().await?;
    println!("✅ Configuration reset to defaults");
    Ok(())
}
