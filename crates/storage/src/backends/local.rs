//! The small-capacity tier.
//!
//! A synchronous string map with a hard byte budget, optionally mirrored to a
//! JSON file that is rewritten after every mutation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use reader_types::StorageLocation;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::keys::{flat_key, parse_flat_key};
use crate::schema::Collection;
use crate::traits::Tier;

/// Default byte budget, the usual browser local-storage quota.
pub const DEFAULT_SMALL_CAPACITY: u64 = 5 * 1024 * 1024;

/// Capacity-limited synchronous key-value store.
///
/// Every entry costs the byte length of its key plus its value. A write that
/// would exceed the capacity fails with [`StorageError::CapacityExceeded`]
/// and leaves the store unchanged.
#[derive(Debug)]
pub struct LocalStore {
    capacity: u64,
    mirror: Option<PathBuf>,
    state: Mutex<LocalState>,
}

#[derive(Debug, Default)]
struct LocalState {
    entries: BTreeMap<String, String>,
    used: u64,
}

fn entry_cost(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

impl LocalStore {
    /// Create a store that lives only in memory.
    pub fn in_memory(capacity: u64) -> Self {
        Self {
            capacity,
            mirror: None,
            state: Mutex::new(LocalState::default()),
        }
    }

    /// Open a store mirrored to the JSON file at `path`, loading its entries.
    ///
    /// A missing file is treated as an empty store.
    pub fn open<P: AsRef<Path>>(path: P, capacity: u64) -> Result<Self> {
        let path = path.as_ref();
        let entries: BTreeMap<String, String> = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| StorageError::conversion("Failed to parse local store file", e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::backend("read local store file", e)),
        };

        let used = entries.iter().map(|(k, v)| entry_cost(k, v)).sum();
        debug!(path = %path.display(), entries = entries.len(), used, "opened local store");

        Ok(Self {
            capacity,
            mirror: Some(path.to_path_buf()),
            state: Mutex::new(LocalState { entries, used }),
        })
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn used_bytes(&self) -> Result<u64> {
        Ok(self.state()?.used)
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state()?.entries.get(key).cloned())
    }

    pub fn set_item(&self, key: &str, value: String) -> Result<()> {
        let mut state = self.state()?;

        let previous_cost = state
            .entries
            .get(key)
            .map(|old| entry_cost(key, old))
            .unwrap_or(0);
        let required = entry_cost(key, &value);
        let available = self.capacity.saturating_sub(state.used - previous_cost);
        if required > available {
            return Err(StorageError::CapacityExceeded {
                key: key.to_string(),
                required,
                available,
            });
        }

        let previous = state.entries.insert(key.to_string(), value);
        state.used = state.used - previous_cost + required;

        if let Err(e) = self.flush(&state) {
            match previous {
                Some(old) => state.entries.insert(key.to_string(), old),
                None => state.entries.remove(key),
            };
            state.used = state.used - required + previous_cost;
            return Err(e);
        }
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<bool> {
        let mut state = self.state()?;
        let Some(old) = state.entries.remove(key) else {
            return Ok(false);
        };
        state.used -= entry_cost(key, &old);

        if let Err(e) = self.flush(&state) {
            state.used += entry_cost(key, &old);
            state.entries.insert(key.to_string(), old);
            return Err(e);
        }
        Ok(true)
    }

    /// Remove every key matching `predicate`, returning how many were removed.
    pub fn remove_where(&self, predicate: impl Fn(&str) -> bool) -> Result<usize> {
        let mut state = self.state()?;
        let doomed: Vec<String> = state
            .entries
            .keys()
            .filter(|key| predicate(key))
            .cloned()
            .collect();
        if doomed.is_empty() {
            return Ok(0);
        }

        let snapshot = (state.entries.clone(), state.used);
        for key in &doomed {
            if let Some(old) = state.entries.remove(key) {
                state.used -= entry_cost(key, &old);
            }
        }

        if let Err(e) = self.flush(&state) {
            (state.entries, state.used) = snapshot;
            return Err(e);
        }
        Ok(doomed.len())
    }

    pub fn item_keys(&self) -> Result<Vec<String>> {
        Ok(self.state()?.entries.keys().cloned().collect())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.state()?.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn state(&self) -> Result<MutexGuard<'_, LocalState>> {
        self.state.lock().map_err(|_| StorageError::BackendError {
            operation: "lock local store".to_string(),
            source: None,
        })
    }

    fn flush(&self, state: &LocalState) -> Result<()> {
        let Some(path) = &self.mirror else {
            return Ok(());
        };

        let content = serde_json::to_string(&state.entries)
            .map_err(|e| StorageError::conversion("Failed to serialize local store", e))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::backend("create local store directory", e))?;
        }
        let temp = path.with_extension("json.tmp");
        std::fs::write(&temp, content)
            .map_err(|e| StorageError::backend("write local store file", e))?;
        std::fs::rename(&temp, path)
            .map_err(|e| StorageError::backend("replace local store file", e))?;
        Ok(())
    }

    fn decode(key: &str, raw: &str) -> Result<Value> {
        serde_json::from_str(raw)
            .map_err(|e| StorageError::conversion(format!("Failed to parse entry {key}"), e))
    }
}

#[async_trait]
impl Tier for LocalStore {
    fn location(&self) -> StorageLocation {
        StorageLocation::SmallStore
    }

    async fn put(&self, collection: Collection, key: &str, value: &Value) -> Result<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| StorageError::conversion("Failed to serialize record", e))?;
        self.set_item(&flat_key(collection, key), raw)
    }

    async fn get(&self, collection: Collection, key: &str) -> Result<Option<Value>> {
        let flat = flat_key(collection, key);
        self.get_item(&flat)?
            .map(|raw| Self::decode(&flat, &raw))
            .transpose()
    }

    async fn delete(&self, collection: Collection, key: &str) -> Result<bool> {
        self.remove_item(&flat_key(collection, key))
    }

    async fn keys(&self, collection: Collection) -> Result<Vec<String>> {
        Ok(self
            .item_keys()?
            .iter()
            .filter_map(|flat| parse_flat_key(flat))
            .filter(|(owner, _)| *owner == collection)
            .map(|(_, key)| key.to_string())
            .collect())
    }

    async fn list_all(&self, collection: Collection) -> Result<Vec<Value>> {
        let state = self.state()?;
        state
            .entries
            .iter()
            .filter(|(flat, _)| matches!(parse_flat_key(flat), Some((owner, _)) if owner == collection))
            .map(|(flat, raw)| Self::decode(flat, raw))
            .collect()
    }

    async fn clear(&self, collection: Collection) -> Result<()> {
        let removed = self.remove_where(|flat| {
            matches!(parse_flat_key(flat), Some((owner, _)) if owner == collection)
        })?;
        debug!(%collection, removed, "cleared small store collection");
        Ok(())
    }

    async fn entry_count(&self) -> Result<usize> {
        self.len()
    }

    async fn usage(&self) -> Result<Option<u64>> {
        self.used_bytes().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn capacity_is_enforced() {
        let store = LocalStore::in_memory(10);
        store.set_item("ab", "123".to_string()).unwrap();
        assert_eq!(store.used_bytes().unwrap(), 5);

        let err = store.set_item("cd", "123456".to_string()).unwrap_err();
        assert!(matches!(
            err,
            StorageError::CapacityExceeded {
                required: 8,
                available: 5,
                ..
            }
        ));
        assert_eq!(store.get_item("cd").unwrap(), None);
        assert_eq!(store.used_bytes().unwrap(), 5);
    }

    #[test]
    fn overwrite_reuses_the_old_entry_budget() {
        let store = LocalStore::in_memory(10);
        store.set_item("ab", "12345678".to_string()).unwrap();
        store.set_item("ab", "87654321".to_string()).unwrap();
        assert_eq!(store.get_item("ab").unwrap().as_deref(), Some("87654321"));
        assert_eq!(store.used_bytes().unwrap(), 10);
    }

    #[test]
    fn remove_frees_space() {
        let store = LocalStore::in_memory(100);
        store.set_item("k", "v".to_string()).unwrap();
        assert!(store.remove_item("k").unwrap());
        assert!(!store.remove_item("k").unwrap());
        assert_eq!(store.used_bytes().unwrap(), 0);
    }

    #[test]
    fn mirror_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("local.json");

        let store = LocalStore::open(&path, 1024).unwrap();
        store.set_item("settings", "{}".to_string()).unwrap();
        store.set_item("novel_a", "{\"id\":\"a\"}".to_string()).unwrap();
        drop(store);

        let reopened = LocalStore::open(&path, 1024).unwrap();
        assert_eq!(reopened.len().unwrap(), 2);
        assert_eq!(reopened.used_bytes().unwrap(), 8 + 2 + 7 + 10);
    }

    #[tokio::test]
    async fn collections_are_prefixes() {
        let store = LocalStore::in_memory(DEFAULT_SMALL_CAPACITY);
        store
            .put(Collection::Novels, "a", &json!({"id": "a"}))
            .await
            .unwrap();
        store
            .put(Collection::Progress, "a", &json!({"novelId": "a"}))
            .await
            .unwrap();
        store.set_item("unrelated", "x".to_string()).unwrap();

        assert_eq!(store.keys(Collection::Novels).await.unwrap(), ["a"]);
        assert_eq!(store.list_all(Collection::Progress).await.unwrap().len(), 1);

        store.clear(Collection::Novels).await.unwrap();
        assert!(store.get(Collection::Novels, "a").await.unwrap().is_none());
        assert!(store.get(Collection::Progress, "a").await.unwrap().is_some());
        assert_eq!(store.entry_count().await.unwrap(), 2);
    }
}
