//! Filesystem-backed large-capacity tier.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reader_types::StorageLocation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::index::{record_term, term as index_term};
use crate::error::{Result, StorageError};
use crate::schema::{Collection, Schema, SchemaReport};
use crate::traits::{IndexedTier, Tier};

/// Large-capacity tier storing each record as a JSON file.
///
/// Directory structure:
/// ```text
/// storage_root/
/// +-- schema.json
/// +-- novels/
/// |   +-- {sha256(key)}.json
/// +-- progress/
/// +-- fonts/
/// +-- settings/
/// ```
///
/// Indexes are declared in `schema.json` and answered by scanning the
/// collection directory.
#[derive(Debug)]
pub struct FilesystemIndexedStore {
    root_path: PathBuf,
    schema: RwLock<Option<Schema>>,
}

/// On-disk envelope of a record.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    key: String,
    value: Value,
}

impl FilesystemIndexedStore {
    /// Create a new filesystem tier rooted at `root_path`.
    ///
    /// Nothing is touched on disk until [`IndexedTier::initialize`] runs.
    pub fn new<P: AsRef<Path>>(root_path: P) -> Self {
        Self {
            root_path: root_path.as_ref().to_path_buf(),
            schema: RwLock::new(None),
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    fn schema_path(&self) -> PathBuf {
        self.root_path.join("schema.json")
    }

    fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.root_path.join(collection.name())
    }

    fn record_path(&self, collection: Collection, key: &str) -> PathBuf {
        let hash = format!("{:x}", Sha256::digest(key.as_bytes()));
        self.collection_dir(collection).join(format!("{hash}.json"))
    }

    /// Ensure the tier is initialized and declares `collection`.
    async fn check(&self, operation: &str, collection: Collection) -> Result<()> {
        let guard = self.schema.read().await;
        let schema = guard
            .as_ref()
            .ok_or_else(|| StorageError::unavailable(format!("{operation} {collection}")))?;
        schema.require(collection)?;
        Ok(())
    }

    async fn load_schema(&self) -> Result<Option<Schema>> {
        let path = self.schema_path();
        if !fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::backend("check schema file", e))?
        {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| StorageError::backend("read schema file", e))?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StorageError::conversion("Failed to deserialize schema", e))
    }

    async fn read_record(&self, path: &Path) -> Result<StoredRecord> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| StorageError::backend("read record file", e))?;
        serde_json::from_str(&content)
            .map_err(|e| StorageError::conversion("Failed to deserialize record", e))
    }

    async fn write_atomic(&self, path: &Path, content: String) -> Result<()> {
        let temp = path.with_extension("json.tmp");
        fs::write(&temp, content)
            .await
            .map_err(|e| StorageError::backend("write record file", e))?;
        fs::rename(&temp, path)
            .await
            .map_err(|e| StorageError::backend("replace record file", e))?;
        Ok(())
    }

    /// Every readable record of `collection`. Unreadable files are skipped.
    async fn records(&self, collection: Collection) -> Result<Vec<StoredRecord>> {
        let dir = self.collection_dir(collection);
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| StorageError::backend("read collection directory", e))?;

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::backend("read collection directory", e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match self.read_record(&path).await {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable record"),
            }
        }

        records.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(records)
    }

    async fn directory_size(dir: &Path) -> Result<(u64, usize)> {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((0, 0)),
            Err(e) => return Err(StorageError::backend("read collection directory", e)),
        };

        let mut bytes = 0;
        let mut files = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::backend("read collection directory", e))?
        {
            let metadata = entry
                .metadata()
                .await
                .map_err(|e| StorageError::backend("read file metadata", e))?;
            if metadata.is_file() {
                bytes += metadata.len();
                files += 1;
            }
        }
        Ok((bytes, files))
    }
}

#[async_trait]
impl Tier for FilesystemIndexedStore {
    fn location(&self) -> StorageLocation {
        StorageLocation::LargeStore
    }

    async fn put(&self, collection: Collection, key: &str, value: &Value) -> Result<()> {
        self.check("put", collection).await?;

        let record = StoredRecord {
            key: key.to_string(),
            value: value.clone(),
        };
        let content = serde_json::to_string(&record)
            .map_err(|e| StorageError::conversion("Failed to serialize record", e))?;

        self.write_atomic(&self.record_path(collection, key), content)
            .await
    }

    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>> {
        self.check("get", collection).await?;

        let path = self.record_path(collection, key);
        match fs::try_exists(&path).await {
            Ok(true) => Ok(Some(self.read_record(&path).await?.value)),
            Ok(false) => Ok(None),
            Err(e) => Err(StorageError::backend("check record file", e)),
        }
    }

    async fn delete(&self, collection: Collection, key: &str) -> Result<bool> {
        self.check("delete", collection).await?;

        match fs::remove_file(self.record_path(collection, key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::backend("delete record file", e)),
        }
    }

    async fn keys(&self, collection: Collection) -> Result<Vec<String>> {
        self.check("keys", collection).await?;
        Ok(self
            .records(collection)
            .await?
            .into_iter()
            .map(|record| record.key)
            .collect())
    }

    async fn list_all(&self, collection: Collection) -> Result<Vec<Value>> {
        self.check("list", collection).await?;
        Ok(self
            .records(collection)
            .await?
            .into_iter()
            .map(|record| record.value)
            .collect())
    }

    async fn clear(&self, collection: Collection) -> Result<()> {
        self.check("clear", collection).await?;

        let dir = self.collection_dir(collection);
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| StorageError::backend("clear collection directory", e))?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::backend("create collection directory", e))?;

        debug!(%collection, "cleared filesystem collection");
        Ok(())
    }

    async fn entry_count(&self) -> Result<usize> {
        let collections = match self.schema.read().await.as_ref() {
            Some(schema) => schema
                .collections
                .iter()
                .map(|c| c.collection)
                .collect::<Vec<_>>(),
            None => return Err(StorageError::unavailable("count entries")),
        };

        let mut total = 0;
        for collection in collections {
            total += Self::directory_size(&self.collection_dir(collection)).await?.1;
        }
        Ok(total)
    }

    async fn usage(&self) -> Result<Option<u64>> {
        let collections = match self.schema.read().await.as_ref() {
            Some(schema) => schema
                .collections
                .iter()
                .map(|c| c.collection)
                .collect::<Vec<_>>(),
            None => return Err(StorageError::unavailable("estimate usage")),
        };

        let (mut total, _) = Self::directory_size(&self.root_path).await?;
        for collection in collections {
            total += Self::directory_size(&self.collection_dir(collection)).await?.0;
        }
        Ok(Some(total))
    }
}

#[async_trait]
impl IndexedTier for FilesystemIndexedStore {
    fn as_tier(&self) -> &dyn Tier {
        self
    }

    async fn initialize(&self, schema: &Schema) -> Result<SchemaReport> {
        fs::create_dir_all(&self.root_path)
            .await
            .map_err(|e| StorageError::backend("create storage root", e))?;

        let mut guard = self.schema.write().await;
        let mut current = match guard.as_ref() {
            Some(current) => current.clone(),
            None => self.load_schema().await?.unwrap_or_default(),
        };
        let report = current.upgrade(schema)?;

        for collection in &current.collections {
            fs::create_dir_all(self.collection_dir(collection.collection))
                .await
                .map_err(|e| StorageError::backend("create collection directory", e))?;
        }

        let content = serde_json::to_string_pretty(&current)
            .map_err(|e| StorageError::conversion("Failed to serialize schema", e))?;
        self.write_atomic(&self.schema_path(), content).await?;

        debug!(
            root = %self.root_path.display(),
            version = report.version,
            created_collections = report.created_collections.len(),
            "initialized filesystem store"
        );

        *guard = Some(current);
        Ok(report)
    }

    async fn is_initialized(&self) -> bool {
        self.schema.read().await.is_some()
    }

    async fn find_by_index(
        &self,
        collection: Collection,
        index: &str,
        value: &Value,
    ) -> Result<Vec<Value>> {
        let key_path = {
            let guard = self.schema.read().await;
            let schema = guard
                .as_ref()
                .ok_or_else(|| StorageError::unavailable(format!("query {collection}")))?;
            schema
                .require(collection)?
                .index(index)
                .map(|index| index.key_path.clone())
                .ok_or_else(|| StorageError::UnknownIndex {
                    collection: collection.to_string(),
                    index: index.to_string(),
                })?
        };

        let Some(wanted) = index_term(value) else {
            return Ok(Vec::new());
        };

        Ok(self
            .records(collection)
            .await?
            .into_iter()
            .map(|record| record.value)
            .filter(|record| record_term(record, &key_path).as_deref() == Some(wanted.as_str()))
            .collect())
    }
}
