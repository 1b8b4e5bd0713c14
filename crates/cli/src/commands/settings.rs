//! Typography settings and custom font command handlers.

use eyre::Result;
use reader_session::ReaderSession;
use reader_types::SettingKey;

use crate::cli::{ResetScope, SettingsCommands};

pub async fn handle_settings_command(
    cmd: SettingsCommands,
    session: &mut ReaderSession,
    dry_run: bool,
) -> Result<()> {
    match cmd {
        SettingsCommands::Show => {
            handle_show_settings(session);
            Ok(())
        }
        SettingsCommands::Set { key, value } => {
            handle_set_setting(key, value, session, dry_run).await
        }
        SettingsCommands::Reset { scope } => handle_reset_settings(scope, session, dry_run).await,
    }
}

fn handle_show_settings(session: &ReaderSession) {
    let settings = session.settings();
    println!("Settings:");
    for key in SettingKey::ALL {
        println!("  {}: {}", key.as_str(), settings.get(key));
    }
    match session.font() {
        Some(font) => println!("  font: {} ({})", font.name, font.file_type),
        None => println!("  font: default"),
    }
}

async fn handle_set_setting(
    key: String,
    value: String,
    session: &mut ReaderSession,
    dry_run: bool,
) -> Result<()> {
    let key: SettingKey = key.parse()?;

    if dry_run {
        let mut preview = session.settings().clone();
        preview.set(key, &value)?;
        println!(
            "Would set {}: {} -> {}",
            key.as_str(),
            session.settings().get(key),
            preview.get(key)
        );
        return Ok(());
    }

    session.set_setting(key, &value)?;
    session.flush().await?;
    println!("✅ {} = {}", key.as_str(), session.settings().get(key));
    Ok(())
}

async fn handle_reset_settings(
    scope: ResetScope,
    session: &mut ReaderSession,
    dry_run: bool,
) -> Result<()> {
    if dry_run {
        println!("Would reset {:?} settings to defaults", scope);
        return Ok(());
    }

    match scope {
        ResetScope::Text => session.reset_text_style().await?,
        ResetScope::Paragraph => session.reset_paragraph_style().await?,
        ResetScope::Font => session.reset_font().await?,
        ResetScope::All => session.reset_all_styles().await?,
    }
    println!("✅ Settings reset");
    handle_show_settings(session);
    Ok(())
}
