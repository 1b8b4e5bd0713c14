use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier of a novel.
///
/// Derived from the file name, size and modification time rather than the
/// content, so two distinct files sharing all three collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NovelId(pub String);

impl NovelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NovelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NovelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for NovelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One titled section of a novel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub content: String,
}

impl Chapter {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// A parsed novel with its full chapter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Novel {
    pub id: NovelId,
    pub name: String,
    pub chapters: Vec<Chapter>,
    /// Size in bytes of the source file.
    #[serde(default)]
    pub size: u64,
    /// Modification time of the source file, in milliseconds since the epoch.
    #[serde(default)]
    pub last_modified: i64,
}

impl Novel {
    pub fn summary(&self, location: StorageLocation) -> NovelSummary {
        NovelSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            size: self.size,
            last_modified: self.last_modified,
            chapter_count: self.chapters.len(),
            location,
            last_read: None,
        }
    }
}

/// Which storage tier a record was found in.
///
/// Only attached to listing and export results; never stored with the record.
/// Serialized with the tag names used by existing backup files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageLocation {
    #[serde(rename = "localStorage")]
    SmallStore,
    #[serde(rename = "indexedDB")]
    LargeStore,
}

impl StorageLocation {
    pub fn other(self) -> Self {
        match self {
            Self::SmallStore => Self::LargeStore,
            Self::LargeStore => Self::SmallStore,
        }
    }
}

impl std::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SmallStore => f.write_str("small store"),
            Self::LargeStore => f.write_str("large store"),
        }
    }
}

/// Metadata-only view of a stored novel, used for library listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NovelSummary {
    pub id: NovelId,
    pub name: String,
    pub size: u64,
    pub last_modified: i64,
    pub chapter_count: usize,
    pub location: StorageLocation,
    pub last_read: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn novel_uses_camel_case_fields() {
        let novel = Novel {
            id: NovelId::from("book_10_1"),
            name: "book.txt".to_string(),
            chapters: vec![Chapter::new("Chapter 1", "A")],
            size: 10,
            last_modified: 1,
        };

        let value = serde_json::to_value(&novel).unwrap();
        assert_eq!(value["id"], "book_10_1");
        assert_eq!(value["lastModified"], 1);
        assert_eq!(value["chapters"][0]["title"], "Chapter 1");
    }

    #[test]
    fn storage_location_tags() {
        assert_eq!(
            serde_json::to_string(&StorageLocation::SmallStore).unwrap(),
            "\"localStorage\""
        );
        assert_eq!(StorageLocation::LargeStore.other(), StorageLocation::SmallStore);
    }
}
