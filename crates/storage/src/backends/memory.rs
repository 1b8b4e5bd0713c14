//! In-memory large-capacity tier with maintained secondary indexes.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use reader_types::StorageLocation;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::index::{record_term, term as index_term};
use crate::error::{Result, StorageError};
use crate::schema::{Collection, CollectionSchema, IndexSchema, Schema, SchemaReport};
use crate::size::serialized_size;
use crate::traits::{IndexedTier, Tier};

/// Large-capacity tier kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryIndexedStore {
    db: RwLock<Option<Database>>,
}

#[derive(Debug)]
struct Database {
    schema: Schema,
    collections: BTreeMap<Collection, CollectionData>,
}

#[derive(Debug, Default)]
struct CollectionData {
    records: BTreeMap<String, Value>,
    /// index name -> term -> primary keys
    indexes: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

impl CollectionData {
    fn build_index(&mut self, index: &IndexSchema) {
        let mut entries: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (key, record) in &self.records {
            if let Some(term) = record_term(record, &index.key_path) {
                entries.entry(term).or_default().insert(key.clone());
            }
        }
        self.indexes.insert(index.name.clone(), entries);
    }

    fn unindex(&mut self, schema: &CollectionSchema, key: &str, record: &Value) {
        for index in &schema.indexes {
            let Some(term) = record_term(record, &index.key_path) else {
                continue;
            };
            if let Some(entries) = self.indexes.get_mut(&index.name) {
                if let Some(keys) = entries.get_mut(&term) {
                    keys.remove(key);
                    if keys.is_empty() {
                        entries.remove(&term);
                    }
                }
            }
        }
    }

    fn insert(&mut self, schema: &CollectionSchema, key: &str, record: Value) {
        if let Some(old) = self.records.remove(key) {
            self.unindex(schema, key, &old);
        }
        for index in &schema.indexes {
            if let Some(term) = record_term(&record, &index.key_path) {
                self.indexes
                    .entry(index.name.clone())
                    .or_default()
                    .entry(term)
                    .or_default()
                    .insert(key.to_string());
            }
        }
        self.records.insert(key.to_string(), record);
    }

    fn remove(&mut self, schema: &CollectionSchema, key: &str) -> bool {
        match self.records.remove(key) {
            Some(old) => {
                self.unindex(schema, key, &old);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        self.records.clear();
        for entries in self.indexes.values_mut() {
            entries.clear();
        }
    }
}

impl Database {
    fn collection(&self, collection: Collection) -> Result<(&CollectionSchema, &CollectionData)> {
        let schema = self.schema.require(collection)?;
        let data = self
            .collections
            .get(&collection)
            .ok_or_else(|| StorageError::UnknownCollection {
                collection: collection.to_string(),
            })?;
        Ok((schema, data))
    }

    fn collection_mut(
        &mut self,
        collection: Collection,
    ) -> Result<(&CollectionSchema, &mut CollectionData)> {
        let schema = self.schema.require(collection)?;
        let data = self
            .collections
            .get_mut(&collection)
            .ok_or_else(|| StorageError::UnknownCollection {
                collection: collection.to_string(),
            })?;
        Ok((schema, data))
    }
}

impl MemoryIndexedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_ready(operation: &str, collection: Collection) -> StorageError {
    StorageError::unavailable(format!("{operation} {collection}"))
}

#[async_trait]
impl Tier for MemoryIndexedStore {
    fn location(&self) -> StorageLocation {
        StorageLocation::LargeStore
    }

    async fn put(&self, collection: Collection, key: &str, value: &Value) -> Result<()> {
        let mut guard = self.db.write().await;
        let db = guard.as_mut().ok_or_else(|| not_ready("put", collection))?;
        let (schema, data) = db.collection_mut(collection)?;
        data.insert(schema, key, value.clone());
        Ok(())
    }

    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>> {
        let guard = self.db.read().await;
        let db = guard.as_ref().ok_or_else(|| not_ready("get", collection))?;
        let (_, data) = db.collection(collection)?;
        Ok(data.records.get(key).cloned())
    }

    async fn delete(&self, collection: Collection, key: &str) -> Result<bool> {
        let mut guard = self.db.write().await;
        let db = guard
            .as_mut()
            .ok_or_else(|| not_ready("delete", collection))?;
        let (schema, data) = db.collection_mut(collection)?;
        Ok(data.remove(schema, key))
    }

    async fn keys(&self, collection: Collection) -> Result<Vec<String>> {
        let guard = self.db.read().await;
        let db = guard.as_ref().ok_or_else(|| not_ready("keys", collection))?;
        let (_, data) = db.collection(collection)?;
        Ok(data.records.keys().cloned().collect())
    }

    async fn list_all(&self, collection: Collection) -> Result<Vec<Value>> {
        let guard = self.db.read().await;
        let db = guard
            .as_ref()
            .ok_or_else(|| not_ready("list", collection))?;
        let (_, data) = db.collection(collection)?;
        Ok(data.records.values().cloned().collect())
    }

    async fn clear(&self, collection: Collection) -> Result<()> {
        let mut guard = self.db.write().await;
        let db = guard
            .as_mut()
            .ok_or_else(|| not_ready("clear", collection))?;
        let (_, data) = db.collection_mut(collection)?;
        data.clear();
        Ok(())
    }

    async fn entry_count(&self) -> Result<usize> {
        let guard = self.db.read().await;
        let db = guard
            .as_ref()
            .ok_or_else(|| StorageError::unavailable("count entries"))?;
        Ok(db.collections.values().map(|data| data.records.len()).sum())
    }

    async fn usage(&self) -> Result<Option<u64>> {
        let guard = self.db.read().await;
        let db = guard
            .as_ref()
            .ok_or_else(|| StorageError::unavailable("estimate usage"))?;

        let mut total = 0;
        for data in db.collections.values() {
            for (key, record) in &data.records {
                total += key.len() as u64
                    + serialized_size(record)
                        .map_err(|e| StorageError::conversion("Failed to measure record", e))?;
            }
        }
        Ok(Some(total))
    }
}

#[async_trait]
impl IndexedTier for MemoryIndexedStore {
    fn as_tier(&self) -> &dyn Tier {
        self
    }

    async fn initialize(&self, schema: &Schema) -> Result<SchemaReport> {
        let mut guard = self.db.write().await;
        let db = guard.get_or_insert_with(|| Database {
            schema: Schema::default(),
            collections: BTreeMap::new(),
        });

        let report = db.schema.upgrade(schema)?;
        for collection in &report.created_collections {
            let mut data = CollectionData::default();
            if let Some(collection_schema) = db.schema.collection(*collection) {
                for index in &collection_schema.indexes {
                    data.build_index(index);
                }
            }
            db.collections.insert(*collection, data);
        }
        for (collection, index_name) in &report.created_indexes {
            let index = db
                .schema
                .collection(*collection)
                .and_then(|c| c.index(index_name))
                .cloned();
            if let (Some(index), Some(data)) = (index, db.collections.get_mut(collection)) {
                data.build_index(&index);
            }
        }

        debug!(
            version = report.version,
            created_collections = report.created_collections.len(),
            created_indexes = report.created_indexes.len(),
            "initialized in-memory store"
        );
        Ok(report)
    }

    async fn is_initialized(&self) -> bool {
        self.db.read().await.is_some()
    }

    async fn find_by_index(
        &self,
        collection: Collection,
        index: &str,
        value: &Value,
    ) -> Result<Vec<Value>> {
        let guard = self.db.read().await;
        let db = guard
            .as_ref()
            .ok_or_else(|| not_ready("query", collection))?;
        let (schema, data) = db.collection(collection)?;
        if schema.index(index).is_none() {
            return Err(StorageError::UnknownIndex {
                collection: collection.to_string(),
                index: index.to_string(),
            });
        }

        let Some(term) = index_term(value) else {
            return Ok(Vec::new());
        };
        let keys = data
            .indexes
            .get(index)
            .and_then(|entries| entries.get(&term));

        Ok(keys
            .into_iter()
            .flatten()
            .filter_map(|key| data.records.get(key).cloned())
            .collect())
    }
}
