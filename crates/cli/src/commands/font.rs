use eyre::{Result, WrapErr};
use reader_session::ReaderSession;
use reader_storage::format_bytes;

use crate::cli::FontCommands;

/// Family name the custom font is registered under in the rendered rule.
const FONT_FAMILY: &str = "CustomUserFont";

pub async fn handle_font_command(
    cmd: FontCommands,
    session: &mut ReaderSession,
    dry_run: bool,
) -> Result<()> {
    match cmd {
        FontCommands::Upload { file } => {
            if dry_run {
                println!("Would use {} as the reading font", file.display());
                return Ok(());
            }
            let font = session
                .upload_font(&file)
                .await
                .wrap_err_with(|| format!("Failed to upload font {}", file.display()))?;
            println!(
                "✅ Using {} ({}, {})",
                font.name,
                font.format.as_str(),
                format_bytes(font.size)
            );
        }
        FontCommands::Reset => {
            if dry_run {
                println!("Would go back to the default font");
                return Ok(());
            }
            session.reset_font().await?;
            println!("✅ Using the default font");
        }
        FontCommands::Show { css } => match session.font() {
            Some(font) => {
                println!("{}", font.name);
                println!("  format: {}", font.format.as_str());
                println!("  size: {}", format_bytes(font.size));
                println!("  uploaded: {}", font.uploaded_at.format("%Y-%m-%d %H:%M"));
                if css {
                    println!("{}", font.font_face_rule(FONT_FAMILY));
                }
            }
            None => println!("No custom font, using the default font"),
        },
    }
    Ok(())
}
