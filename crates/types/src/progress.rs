use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::NovelId;

/// Where the reader left off in a novel. One record per novel, last write wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    pub novel_id: NovelId,
    pub chapter_index: usize,
    pub scroll_position: f64,
    pub last_read: DateTime<Utc>,
}

impl ReadingProgress {
    /// Progress stamped with the current time.
    pub fn now(novel_id: NovelId, chapter_index: usize, scroll_position: f64) -> Self {
        Self {
            novel_id,
            chapter_index,
            scroll_position,
            last_read: Utc::now(),
        }
    }
}
