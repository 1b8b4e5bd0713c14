//! Data model shared by the novel reader crates.
//!
//! Every record here is persisted as camelCase JSON so that backups written by
//! one build can be read by another.

pub mod font;
pub mod novel;
pub mod progress;
pub mod settings;

pub use font::{CustomFont, FONT_ID, FontFormat};
pub use novel::{Chapter, Novel, NovelId, NovelSummary, StorageLocation};
pub use progress::ReadingProgress;
pub use settings::{SettingKey, Settings, UnknownSetting};
