//! Entity references.
//!
//! An [`EntityRef`] is the identity of a linkable review request: the id of
//! the container (repository) it lives in plus its id within that container.
//! It carries no live state; whether the entity still exists is answered by
//! an [`EntityDirectory`](crate::storage::EntityDirectory).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Separator between the two halves of a storage key.
pub const STORAGE_KEY_SEPARATOR: char = '#';

/// Immutable identity of a linkable entity.
///
/// Two references name the same entity iff both ids match exactly.
///
/// # Examples
///
/// ```
/// use review_links::EntityRef;
///
/// let pr = EntityRef::new(12, 345);
/// assert_eq!(pr.storage_key(), "12#345");
/// assert_eq!(EntityRef::from_storage_key("12#345").unwrap(), pr);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    /// Id of the container (repository) holding the entity.
    pub container_id: u32,
    /// Id of the entity within its container.
    pub entity_id: u64,
}

impl EntityRef {
    /// Creates a reference from its two ids.
    #[must_use]
    pub const fn new(container_id: u32, entity_id: u64) -> Self {
        Self {
            container_id,
            entity_id,
        }
    }

    /// Key under which this entity's adjacency list is stored.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{}{STORAGE_KEY_SEPARATOR}{}", self.container_id, self.entity_id)
    }

    /// Parses a key produced by [`EntityRef::storage_key`].
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidStorageKey`] when the key is not two
    /// unsigned integers joined by `#`.
    pub fn from_storage_key(key: &str) -> Result<Self, CodecError> {
        let invalid = |reason: &str| CodecError::InvalidStorageKey {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        let (container, entity) = key
            .split_once(STORAGE_KEY_SEPARATOR)
            .ok_or_else(|| invalid("missing '#' separator"))?;
        let container_id = container
            .parse::<u32>()
            .map_err(|e| invalid(&format!("container id: {e}")))?;
        let entity_id = entity
            .parse::<u64>()
            .map_err(|e| invalid(&format!("entity id: {e}")))?;

        Ok(Self::new(container_id, entity_id))
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container_id, self.entity_id)
    }
}

impl FromStr for EntityRef {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_storage_key(s)
    }
}
