use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[clap(name = "novel-reader", about = "Read plain-text novels split into chapters")]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Show debug logging
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Print what would change without changing anything
    #[clap(long, global = true)]
    pub dry_run: bool,

    /// Storage directory, overriding storage.path from the config
    #[clap(long, global = true)]
    pub storage_path: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Import a .txt file into the library and open it
    Open {
        file: PathBuf,
        /// Only show how the file would be split, without storing it
        #[clap(long)]
        preview: bool,
    },
    /// Browse and maintain stored novels
    Library {
        #[clap(subcommand)]
        command: LibraryCommands,
    },
    /// Read a stored novel, resuming where you left off
    Read {
        novel_id: String,
        /// Jump to a chapter (1-based)
        #[clap(long, conflicts_with_all = ["next", "prev"])]
        chapter: Option<usize>,
        /// Go to the next chapter
        #[clap(long, conflicts_with = "prev")]
        next: bool,
        /// Go to the previous chapter
        #[clap(long)]
        prev: bool,
    },
    /// Typography settings
    Settings {
        #[clap(subcommand)]
        command: SettingsCommands,
    },
    /// Custom reading font
    Font {
        #[clap(subcommand)]
        command: FontCommands,
    },
    /// Backups and storage usage
    Data {
        #[clap(subcommand)]
        command: DataCommands,
    },
    /// Manage configuration
    Config {
        #[clap(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum LibraryCommands {
    /// List stored novels, most recently read first
    List {
        /// Show at most this many novels
        #[clap(long)]
        limit: Option<usize>,
    },
    /// Show details and chapters of a stored novel
    Show { novel_id: String },
    /// Remove a stored novel and its reading progress
    Remove {
        novel_id: String,
        /// Skip confirmation prompt
        #[clap(long)]
        force: bool,
    },
    /// Remove every stored novel
    Clear {
        /// Skip confirmation prompt
        #[clap(long)]
        force: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetScope {
    /// Font size, weight and letter spacing
    Text,
    /// Line height and paragraph spacing
    Paragraph,
    /// Custom font
    Font,
    /// Everything, including the custom font
    All,
}

#[derive(clap::Subcommand, Debug)]
pub enum SettingsCommands {
    /// Show current settings
    Show,
    /// Change a setting (font-size, font-weight, letter-spacing, line-height, paragraph-spacing)
    Set { key: String, value: String },
    /// Restore defaults
    Reset {
        #[clap(value_enum, default_value = "all")]
        scope: ResetScope,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum FontCommands {
    /// Use a .ttf, .otf, .woff or .woff2 file as the reading font
    Upload { file: PathBuf },
    /// Go back to the default font
    Reset,
    /// Show the custom font
    Show {
        /// Print the @font-face rule as well
        #[clap(long)]
        css: bool,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum DataCommands {
    /// Export novels, settings and font to a backup file
    Export {
        /// Directory to write to, overriding export.output_dir
        #[clap(long)]
        dir: Option<PathBuf>,
    },
    /// Import a backup file
    Import { file: PathBuf },
    /// Show storage usage
    Info,
    /// Remove settings and the custom font
    ClearSettings {
        /// Skip confirmation prompt
        #[clap(long)]
        force: bool,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigCommands {
    /// Set a configuration value
    Set { key: String, value: String },
    /// Get a configuration value
    Get { key: String },
    /// Show all configuration
    Show,
    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[clap(long)]
        force: bool,
    },
}
