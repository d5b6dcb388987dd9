//! Abstract collaborator traits.
//!
//! The link core owns no storage of its own. It needs two capabilities from
//! its host:
//! - a [`SettingsStore`]: whole-value get/put/remove by string key, with no
//!   cross-key atomicity and no locking
//! - an [`EntityDirectory`]: answers whether an entity still exists
//!
//! Both are injected as trait objects so tests can substitute in-memory fakes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::EntityRef;

/// Errors that can occur in a collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend error.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O against the backing medium failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// The backing medium is held by someone else.
    #[error("Storage is locked: {0}")]
    Locked(String),
}

/// A value held by the settings store.
///
/// The store treats values as opaque; only the adjacency layer cares that a
/// link list is a [`SettingValue::List`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SettingValue {
    /// A single string.
    Text(String),
    /// An ordered list of strings.
    List(Vec<String>),
    /// A string-to-string map.
    Map(BTreeMap<String, String>),
}

impl SettingValue {
    /// Returns the list if this value is one.
    #[must_use]
    pub fn into_list(self) -> Option<Vec<String>> {
        match self {
            Self::List(entries) => Some(entries),
            Self::Text(_) | Self::Map(_) => None,
        }
    }

    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl From<Vec<String>> for SettingValue {
    fn from(entries: Vec<String>) -> Self {
        Self::List(entries)
    }
}

/// Key-value settings store shared by every adjacency list.
///
/// # Concurrency
/// Implementations must be safe to call from many threads, but nothing more
/// is promised: a read followed by a write is not atomic, and the last writer
/// of a key wins.
pub trait SettingsStore: Send + Sync {
    /// Get the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<SettingValue>, StorageError>;

    /// Replace the value stored under `key`.
    fn put(&self, key: &str, value: SettingValue) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Host entity service, consulted when decoding stored links.
pub trait EntityDirectory: Send + Sync {
    /// Returns true if `entity` still exists.
    fn exists(&self, entity: &EntityRef) -> Result<bool, StorageError>;
}
