//! Schema of the large-capacity tier.
//!
//! The schema is versioned and only ever grows: upgrading creates missing
//! collections and indexes and never drops existing ones, so running
//! initialization twice is harmless.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};

/// Version of [`reader_schema`].
pub const SCHEMA_VERSION: u32 = 2;

/// Named record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Novels,
    Progress,
    Fonts,
    Settings,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Novels,
        Collection::Progress,
        Collection::Fonts,
        Collection::Settings,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Novels => "novels",
            Collection::Progress => "progress",
            Collection::Fonts => "fonts",
            Collection::Settings => "settings",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Secondary lookup index over one field of a collection's records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub name: String,
    /// Dotted path of the indexed field.
    pub key_path: String,
}

impl IndexSchema {
    pub fn new(name: impl Into<String>, key_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_path: key_path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub collection: Collection,
    /// Field of each record holding its primary key.
    pub key_path: String,
    pub indexes: Vec<IndexSchema>,
}

impl CollectionSchema {
    pub fn new(collection: Collection, key_path: impl Into<String>) -> Self {
        Self {
            collection,
            key_path: key_path.into(),
            indexes: Vec::new(),
        }
    }

    pub fn with_index(mut self, name: &str, key_path: &str) -> Self {
        self.indexes.push(IndexSchema::new(name, key_path));
        self
    }

    pub fn index(&self, name: &str) -> Option<&IndexSchema> {
        self.indexes.iter().find(|index| index.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub version: u32,
    pub collections: Vec<CollectionSchema>,
}

impl Schema {
    pub fn collection(&self, collection: Collection) -> Option<&CollectionSchema> {
        self.collections
            .iter()
            .find(|schema| schema.collection == collection)
    }

    /// Look up `collection`, failing if the schema does not declare it.
    pub fn require(&self, collection: Collection) -> Result<&CollectionSchema> {
        self.collection(collection)
            .ok_or_else(|| StorageError::UnknownCollection {
                collection: collection.to_string(),
            })
    }

    /// Bring this schema up to `target`, adding whatever it lacks.
    ///
    /// Nothing is removed. A target older than the current version is refused.
    pub fn upgrade(&mut self, target: &Schema) -> Result<SchemaReport> {
        if target.version < self.version {
            return Err(StorageError::SchemaDowngrade {
                requested: target.version,
                current: self.version,
            });
        }

        let mut report = SchemaReport {
            previous_version: self.version,
            version: target.version,
            ..SchemaReport::default()
        };

        for wanted in &target.collections {
            match self
                .collections
                .iter_mut()
                .find(|existing| existing.collection == wanted.collection)
            {
                Some(existing) => {
                    for index in &wanted.indexes {
                        if existing.index(&index.name).is_none() {
                            existing.indexes.push(index.clone());
                            report
                                .created_indexes
                                .push((wanted.collection, index.name.clone()));
                        }
                    }
                }
                None => {
                    self.collections.push(wanted.clone());
                    report.created_collections.push(wanted.collection);
                }
            }
        }

        self.version = target.version;
        Ok(report)
    }
}

/// What an initialization pass changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaReport {
    pub previous_version: u32,
    pub version: u32,
    pub created_collections: Vec<Collection>,
    pub created_indexes: Vec<(Collection, String)>,
}

impl SchemaReport {
    pub fn is_unchanged(&self) -> bool {
        self.created_collections.is_empty() && self.created_indexes.is_empty()
    }
}

/// The reader's schema: novels, progress, fonts and settings.
pub fn reader_schema() -> Schema {
    Schema {
        version: SCHEMA_VERSION,
        collections: vec![
            CollectionSchema::new(Collection::Novels, "id")
                .with_index("name", "name")
                .with_index("lastRead", "lastRead"),
            CollectionSchema::new(Collection::Progress, "novelId").with_index("lastRead", "lastRead"),
            CollectionSchema::new(Collection::Fonts, "id"),
            CollectionSchema::new(Collection::Settings, "key"),
        ],
    }
}
