//! Error types for the storage tiers and the storage manager.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The small store has no room left for the write. Nothing was changed.
    #[error(
        "Local storage is full: {key} needs {required} bytes but only {available} bytes are free; clear some data or use a smaller file"
    )]
    CapacityExceeded {
        key: String,
        required: u64,
        available: u64,
    },

    #[error("Large-capacity store is not initialized: {operation}")]
    Unavailable { operation: String },

    #[error("Unknown collection: {collection}")]
    UnknownCollection { collection: String },

    #[error("Unknown index {index} on collection {collection}")]
    UnknownIndex { collection: String, index: String },

    #[error("Schema version {requested} is older than the stored version {current}")]
    SchemaDowngrade { requested: u32, current: u32 },

    #[error("Invalid novel data: {message}")]
    InvalidNovelData {
        message: String,
        #[source]
        source: Option<eyre::Report>,
    },

    #[error("Unsupported backup format: {message}")]
    Format {
        message: String,
        #[source]
        source: Option<eyre::Report>,
    },

    #[error("Unsupported file: {}", path.display())]
    UnsupportedFile { path: PathBuf },

    #[error("Data conversion failed: {message}")]
    DataConversionError {
        message: String,
        #[source]
        source: Option<eyre::Report>,
    },

    #[error("Storage operation failed: {operation}")]
    BackendError {
        operation: String,
        #[source]
        source: Option<eyre::Report>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub(crate) fn backend(operation: impl Into<String>, source: impl Into<eyre::Report>) -> Self {
        Self::BackendError {
            operation: operation.into(),
            source: Some(source.into()),
        }
    }

    pub(crate) fn conversion(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::DataConversionError {
            message: message.into(),
            source: Some(eyre::eyre!("JSON error: {}", source)),
        }
    }

    pub(crate) fn unavailable(operation: impl Into<String>) -> Self {
        Self::Unavailable {
            operation: operation.into(),
        }
    }

    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, Self::CapacityExceeded { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
