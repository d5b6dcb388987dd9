//! In-memory storage backend.
//!
//! Thread-safe in-memory implementations of the collaborator traits. They are
//! intended for embedded usage, tests, and as a reference implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::entity::EntityRef;
use crate::linked::LinkGraph;
use crate::storage::traits::{EntityDirectory, SettingValue, SettingsStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Backend(format!("poisoned lock: {context}"))
}

/// Thread-safe in-memory settings store.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    values: RwLock<HashMap<String, SettingValue>>,
}

impl InMemorySettingsStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> Result<usize, StorageError> {
        let values = self.values.read().map_err(|_| lock_err("settings.len"))?;
        Ok(values.len())
    }

    /// Returns true when no key is stored.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        let values = self.values.read().map_err(|_| lock_err("settings.keys"))?;
        let mut keys: Vec<String> = values.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<SettingValue>, StorageError> {
        let values = self.values.read().map_err(|_| lock_err("settings.get"))?;
        Ok(values.get(key).cloned())
    }

    fn put(&self, key: &str, value: SettingValue) -> Result<(), StorageError> {
        let mut values = self.values.write().map_err(|_| lock_err("settings.put"))?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.write().map_err(|_| lock_err("settings.remove"))?;
        values.remove(key);
        Ok(())
    }
}

/// Thread-safe in-memory entity directory.
///
/// Entities exist once [`register`](Self::register)ed and stop existing once
/// [`delete`](Self::delete)d.
#[derive(Debug, Default)]
pub struct InMemoryEntityDirectory {
    live: RwLock<HashSet<EntityRef>>,
}

impl InMemoryEntityDirectory {
    /// Create a new empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `entity` as existing.
    pub fn register(&self, entity: EntityRef) -> Result<(), StorageError> {
        let mut live = self.live.write().map_err(|_| lock_err("directory.register"))?;
        live.insert(entity);
        Ok(())
    }

    /// Mark `entity` as gone. Returns true if it existed.
    pub fn delete(&self, entity: &EntityRef) -> Result<bool, StorageError> {
        let mut live = self.live.write().map_err(|_| lock_err("directory.delete"))?;
        Ok(live.remove(entity))
    }
}

impl EntityDirectory for InMemoryEntityDirectory {
    fn exists(&self, entity: &EntityRef) -> Result<bool, StorageError> {
        let live = self.live.read().map_err(|_| lock_err("directory.exists"))?;
        Ok(live.contains(entity))
    }
}

/// Convenience bundle of in-memory backends.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStores {
    /// Settings store.
    pub settings: Arc<InMemorySettingsStore>,
    /// Entity directory.
    pub directory: Arc<InMemoryEntityDirectory>,
}

impl InMemoryStores {
    /// Create a new bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A [`LinkGraph`] wired to these backends.
    #[must_use]
    pub fn graph(&self) -> LinkGraph {
        LinkGraph::new(self.settings.clone(), self.directory.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_put_get_remove() {
        let store = InMemorySettingsStore::new();
        assert!(store.get("1#1").unwrap().is_none());
        assert!(store.is_empty().unwrap());

        store
            .put("1#1", SettingValue::List(vec!["a".to_string()]))
            .unwrap();
        assert_eq!(
            store.get("1#1").unwrap(),
            Some(SettingValue::List(vec!["a".to_string()]))
        );

        // Whole-value replacement.
        store.put("1#1", SettingValue::Text("b".to_string())).unwrap();
        assert_eq!(store.get("1#1").unwrap(), Some(SettingValue::Text("b".to_string())));
        assert_eq!(store.keys().unwrap(), vec!["1#1".to_string()]);

        store.remove("1#1").unwrap();
        assert!(store.get("1#1").unwrap().is_none());
        // Removing an absent key is fine.
        store.remove("1#1").unwrap();
    }

    #[test]
    fn directory_register_and_delete() {
        let dir = InMemoryEntityDirectory::new();
        let pr = EntityRef::new(1, 9);
        assert!(!dir.exists(&pr).unwrap());

        dir.register(pr).unwrap();
        assert!(dir.exists(&pr).unwrap());

        assert!(dir.delete(&pr).unwrap());
        assert!(!dir.exists(&pr).unwrap());
        assert!(!dir.delete(&pr).unwrap());
    }

    #[test]
    fn bundle_shares_backends_with_graph() {
        let stores = InMemoryStores::new();
        let graph = stores.graph();
        stores.directory.register(EntityRef::new(1, 1)).unwrap();
        assert!(graph.directory().exists(&EntityRef::new(1, 1)).unwrap());
    }
}
