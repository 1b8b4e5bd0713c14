pub mod config;
pub mod data;
pub mod font;
pub mod library;
pub mod read;
pub mod settings;

use std::io::{self, Write};

use eyre::Result;

pub use config::handle_config_command;
pub use data::handle_data_command;
pub use font::handle_font_command;
pub use library::handle_library_command;
pub use read::{handle_open_command, handle_read_command};
pub use settings::handle_settings_command;

/// Ask a yes/no question on stdin. Anything but an answer starting with `y` is a no.
pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    print!("{} (y/N): ", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_lowercase().starts_with('y'))
}
