//! Which tier each kind of record is stored in.

use reader_types::{Novel, StorageLocation};

use crate::error::{Result, StorageError};
use crate::schema::Collection;
use crate::size::serialized_size;

/// Novels whose serialized chapters exceed this many bytes go to the large tier.
pub const LARGE_NOVEL_THRESHOLD: u64 = 1024 * 1024;

/// Tier selection rules.
///
/// Progress and settings always live in the small tier, fonts always in the
/// large one. Novels are routed by the serialized size of their chapters,
/// evaluated on every save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingPolicy {
    pub large_threshold: u64,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            large_threshold: LARGE_NOVEL_THRESHOLD,
        }
    }
}

impl RoutingPolicy {
    pub fn new(large_threshold: u64) -> Self {
        Self { large_threshold }
    }

    /// Fixed tier of `collection`, or `None` if it is routed per record.
    pub fn fixed_location(&self, collection: Collection) -> Option<StorageLocation> {
        match collection {
            Collection::Progress | Collection::Settings => Some(StorageLocation::SmallStore),
            Collection::Fonts => Some(StorageLocation::LargeStore),
            Collection::Novels => None,
        }
    }

    pub fn location_for_size(&self, size: u64) -> StorageLocation {
        if size > self.large_threshold {
            StorageLocation::LargeStore
        } else {
            StorageLocation::SmallStore
        }
    }

    /// Tier for `novel` along with the estimated size of its chapters.
    pub fn location_for_novel(&self, novel: &Novel) -> Result<(StorageLocation, u64)> {
        let size = serialized_size(&novel.chapters)
            .map_err(|e| StorageError::conversion("Failed to measure novel chapters", e))?;
        Ok((self.location_for_size(size), size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reader_types::{Chapter, NovelId};

    fn novel_with_content(content: String) -> Novel {
        Novel {
            id: NovelId::from("n"),
            name: "n.txt".to_string(),
            chapters: vec![Chapter::new("Chapter 1", content)],
            size: 0,
            last_modified: 0,
        }
    }

    #[test]
    fn threshold_is_exclusive() {
        let policy = RoutingPolicy::new(100);
        assert_eq!(policy.location_for_size(100), StorageLocation::SmallStore);
        assert_eq!(policy.location_for_size(101), StorageLocation::LargeStore);
    }

    #[test]
    fn novels_routed_by_chapter_size() {
        let policy = RoutingPolicy::default();

        let (location, size) = policy
            .location_for_novel(&novel_with_content("short".to_string()))
            .unwrap();
        assert_eq!(location, StorageLocation::SmallStore);
        assert!(size < 100);

        let big = "x".repeat(LARGE_NOVEL_THRESHOLD as usize);
        let (location, size) = policy.location_for_novel(&novel_with_content(big)).unwrap();
        assert_eq!(location, StorageLocation::LargeStore);
        assert!(size > LARGE_NOVEL_THRESHOLD);
    }

    #[test]
    fn fixed_routes() {
        let policy = RoutingPolicy::default();
        assert_eq!(
            policy.fixed_location(Collection::Settings),
            Some(StorageLocation::SmallStore)
        );
        assert_eq!(
            policy.fixed_location(Collection::Fonts),
            Some(StorageLocation::LargeStore)
        );
        assert_eq!(policy.fixed_location(Collection::Novels), None);
    }
}
