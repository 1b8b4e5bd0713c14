//! Errors surfaced by reader session operations.

use std::path::PathBuf;

use reader_parser::ParseError;
use reader_storage::StorageError;
use reader_types::{NovelId, UnknownSetting};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Setting(#[from] UnknownSetting),

    #[error("Novel not found: {id}")]
    NovelNotFound { id: NovelId },

    #[error("Chapter {index} is out of range, the novel has {count} chapters")]
    ChapterOutOfRange { index: usize, count: usize },

    #[error("No novel is open")]
    NoOpenNovel,

    #[error("Unsupported font file, expected .ttf, .otf, .woff or .woff2: {}", path.display())]
    UnsupportedFont { path: PathBuf },

    #[error("Failed to read font file: {}", path.display())]
    FontIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ReaderError>;
