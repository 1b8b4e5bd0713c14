//! Supporting types for the storage manager.

use serde::{Deserialize, Serialize};

use crate::format::format_bytes;

/// Storage usage across both tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub total_size: u64,
    /// Entries in the small store.
    pub items_count: usize,
    pub formatted_size: String,
}

impl StorageInfo {
    pub fn new(total_size: u64, items_count: usize) -> Self {
        Self {
            total_size,
            items_count,
            formatted_size: format_bytes(total_size),
        }
    }
}

impl Default for StorageInfo {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
