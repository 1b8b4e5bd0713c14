//! Error types for reading and segmenting source files.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("File has no content: {name}")]
    EmptyFile { name: String },

    #[error("Unsupported file type, expected a .txt file: {}", path.display())]
    UnsupportedExtension { path: PathBuf },

    #[error("Failed to read file: {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ParseError>;
