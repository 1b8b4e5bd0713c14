//! Trait definitions for the storage tiers.

use async_trait::async_trait;
use reader_types::StorageLocation;
use serde_json::Value;

use crate::error::Result;
use crate::schema::{Collection, Schema, SchemaReport};

/// Uniform key-value contract shared by both tiers.
///
/// Records are JSON values grouped into [`Collection`]s. Which tier a record
/// goes to is decided by the caller, never by the tier.
#[async_trait]
pub trait Tier: Send + Sync {
    /// Which tier this is.
    fn location(&self) -> StorageLocation;

    /// Insert or replace a record.
    async fn put(&self, collection: Collection, key: &str, value: &Value) -> Result<()>;

    /// Get a record by key.
    ///
    /// # Returns
    /// `Some(value)` if found, `None` if not found
    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>>;

    /// Delete a record.
    ///
    /// # Returns
    /// `true` if the record was deleted, `false` if it didn't exist
    async fn delete(&self, collection: Collection, key: &str) -> Result<bool>;

    /// Keys of every record in `collection`.
    async fn keys(&self, collection: Collection) -> Result<Vec<String>>;

    /// Every record in `collection`.
    async fn list_all(&self, collection: Collection) -> Result<Vec<Value>>;

    /// Delete every record in `collection`.
    async fn clear(&self, collection: Collection) -> Result<()>;

    /// Number of stored entries across all collections.
    async fn entry_count(&self) -> Result<usize>;

    /// Bytes in use, if the tier can tell.
    async fn usage(&self) -> Result<Option<u64>>;
}

/// The large-capacity tier: schema-based with secondary indexes.
///
/// Every [`Tier`] operation fails with
/// [`StorageError::Unavailable`](crate::StorageError::Unavailable) until
/// [`initialize`](IndexedTier::initialize) has succeeded.
#[async_trait]
pub trait IndexedTier: Tier {
    /// View as a plain [`Tier`].
    fn as_tier(&self) -> &dyn Tier;

    /// Create or upgrade the schema. Safe to run more than once.
    async fn initialize(&self, schema: &Schema) -> Result<SchemaReport>;

    async fn is_initialized(&self) -> bool;

    /// Records of `collection` whose indexed field equals `value`.
    async fn find_by_index(
        &self,
        collection: Collection,
        index: &str,
        value: &Value,
    ) -> Result<Vec<Value>>;
}
