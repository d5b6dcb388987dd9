//! Per-entity adjacency lists on top of the settings store.
//!
//! Every mutation is a read-modify-write of the whole list under one key.
//! Nothing here is atomic against other writers of the same key: the last
//! writer wins.

use tracing::{debug, warn};

use crate::storage::{SettingValue, SettingsStore, StorageError};

/// List-mutation helpers over a [`SettingsStore`].
#[derive(Clone, Copy)]
pub struct AdjacencyStore<'a> {
    settings: &'a dyn SettingsStore,
}

impl<'a> AdjacencyStore<'a> {
    /// Wraps a settings store.
    #[must_use]
    pub fn new(settings: &'a dyn SettingsStore) -> Self {
        Self { settings }
    }

    /// Reads the list stored under `key`.
    ///
    /// An absent key reads as an empty list. A value that is not a list is
    /// treated as corrupted: the key is cleared and an empty list returned.
    pub fn read_list(&self, key: &str) -> Result<Vec<String>, StorageError> {
        match self.settings.get(key)? {
            None => Ok(Vec::new()),
            Some(SettingValue::List(entries)) => Ok(entries),
            Some(other) => {
                warn!(key, kind = other.kind(), "links.adjacency.non_list_cleared");
                self.settings.remove(key)?;
                Ok(Vec::new())
            }
        }
    }

    /// Appends `entry` to the list under `key`.
    pub fn insert(&self, key: &str, entry: &str) -> Result<(), StorageError> {
        let mut entries = self.read_list(key)?;
        entries.push(entry.to_string());
        debug!(key, len = entries.len(), "links.adjacency.insert");
        self.settings.put(key, SettingValue::List(entries))
    }

    /// Removes the first exact match of `entry`. Returns true if one was found.
    ///
    /// Nothing is written when the entry is absent.
    pub fn remove(&self, key: &str, entry: &str) -> Result<bool, StorageError> {
        let mut entries = self.read_list(key)?;
        if !remove_first(&mut entries, entry) {
            return Ok(false);
        }
        debug!(key, len = entries.len(), "links.adjacency.remove");
        self.settings.put(key, SettingValue::List(entries))?;
        Ok(true)
    }

    /// Removes `old_entry` (first match) and appends `new_entry`.
    ///
    /// The new entry lands at the tail of the list.
    pub fn update(&self, key: &str, old_entry: &str, new_entry: &str) -> Result<(), StorageError> {
        let mut entries = self.read_list(key)?;
        if !remove_first(&mut entries, old_entry) {
            debug!(key, "links.adjacency.update_missing_old_entry");
        }
        entries.push(new_entry.to_string());
        debug!(key, len = entries.len(), "links.adjacency.update");
        self.settings.put(key, SettingValue::List(entries))
    }

    /// Overwrites the whole list under `key`.
    pub fn replace(&self, key: &str, entries: Vec<String>) -> Result<(), StorageError> {
        debug!(key, len = entries.len(), "links.adjacency.replace");
        self.settings.put(key, SettingValue::List(entries))
    }
}

fn remove_first(entries: &mut Vec<String>, entry: &str) -> bool {
    match entries.iter().position(|e| e == entry) {
        Some(pos) => {
            entries.remove(pos);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use crate::storage::InMemorySettingsStore;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_absent_key_reads_empty() {
        let settings = InMemorySettingsStore::new();
        let adj = AdjacencyStore::new(&settings);
        assert!(adj.read_list("1#1").unwrap().is_empty());
        // Reading does not create the key.
        assert!(settings.get("1#1").unwrap().is_none());
    }

    #[test]
    fn test_non_list_value_is_cleared() {
        let settings = InMemorySettingsStore::new();
        settings
            .put("1#1", SettingValue::Text("tampered".to_string()))
            .unwrap();
        settings
            .put("1#2", SettingValue::Map(BTreeMap::new()))
            .unwrap();

        let adj = AdjacencyStore::new(&settings);
        assert!(adj.read_list("1#1").unwrap().is_empty());
        assert!(adj.read_list("1#2").unwrap().is_empty());
        assert!(settings.get("1#1").unwrap().is_none());
        assert!(settings.get("1#2").unwrap().is_none());
    }

    #[test]
    fn test_insert_appends_in_order() {
        let settings = InMemorySettingsStore::new();
        let adj = AdjacencyStore::new(&settings);
        adj.insert("k", "a").unwrap();
        adj.insert("k", "b").unwrap();
        adj.insert("k", "a").unwrap();
        assert_eq!(adj.read_list("k").unwrap(), list(&["a", "b", "a"]));
    }

    #[test]
    fn test_insert_over_tampered_value() {
        let settings = InMemorySettingsStore::new();
        settings.put("k", SettingValue::Text("junk".to_string())).unwrap();
        let adj = AdjacencyStore::new(&settings);
        adj.insert("k", "a").unwrap();
        assert_eq!(adj.read_list("k").unwrap(), list(&["a"]));
    }

    #[test]
    fn test_remove_first_match_only() {
        let settings = InMemorySettingsStore::new();
        let adj = AdjacencyStore::new(&settings);
        adj.replace("k", list(&["a", "b", "a"])).unwrap();

        assert!(adj.remove("k", "a").unwrap());
        assert_eq!(adj.read_list("k").unwrap(), list(&["b", "a"]));

        assert!(!adj.remove("k", "zzz").unwrap());
        assert_eq!(adj.read_list("k").unwrap(), list(&["b", "a"]));
    }

    #[test]
    fn test_remove_last_entry_leaves_empty_list() {
        let settings = InMemorySettingsStore::new();
        let adj = AdjacencyStore::new(&settings);
        adj.insert("k", "a").unwrap();
        assert!(adj.remove("k", "a").unwrap());
        assert_eq!(settings.get("k").unwrap(), Some(SettingValue::List(Vec::new())));
    }

    #[test]
    fn test_update_replaces_and_moves_to_tail() {
        let settings = InMemorySettingsStore::new();
        let adj = AdjacencyStore::new(&settings);
        adj.replace("k", list(&["a", "b", "c"])).unwrap();

        adj.update("k", "a", "A").unwrap();
        assert_eq!(adj.read_list("k").unwrap(), list(&["b", "c", "A"]));

        // Same value: still moves to tail, no duplicate.
        adj.update("k", "b", "b").unwrap();
        assert_eq!(adj.read_list("k").unwrap(), list(&["c", "A", "b"]));
    }
}
