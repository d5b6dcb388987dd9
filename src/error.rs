//! Error types for review links.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the specific condition. Validation errors are caller-correctable and are
//! raised before any mutation; storage errors come from the backing store
//! and are passed through unchanged.

use thiserror::Error;

use crate::direction::Direction;
use crate::entity::EntityRef;
use crate::link::LinkId;
use crate::storage::StorageError;

/// Errors raised while validating a manager operation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Entity {entity} cannot be linked to itself")]
    SelfLink {
        entity: EntityRef,
    },

    #[error("Link from {root} to {target} already exists")]
    DuplicateLink {
        root: EntityRef,
        target: EntityRef,
    },

    #[error("Direction {direction} cannot be requested directly")]
    InvalidDirection {
        direction: Direction,
    },

    #[error("Entity {entity} does not exist")]
    UnknownEntity {
        entity: EntityRef,
    },

    #[error("Link not found: {id}")]
    NotFound {
        id: LinkId,
    },

    #[error("Cannot remove direction {requested} from a link stored as {stored}")]
    DirectionMismatch {
        stored: Direction,
        requested: Direction,
    },
}

/// Errors decoding stored link entries or storage keys.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Corrupt link entry {entry:?}: {reason}")]
    CorruptEntry {
        entry: String,
        reason: String,
    },

    #[error("Unknown direction: {value}")]
    UnknownDirection {
        value: String,
    },

    #[error("Invalid storage key {key:?}: {reason}")]
    InvalidStorageKey {
        key: String,
        reason: String,
    },
}

impl CodecError {
    pub(crate) fn corrupt(entry: &str, reason: impl Into<String>) -> Self {
        Self::CorruptEntry {
            entry: entry.to_string(),
            reason: reason.into(),
        }
    }
}

/// Top-level error type for link operations.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl LinkError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if a stored entry could not be decoded.
    #[must_use]
    pub const fn is_corrupt(&self) -> bool {
        matches!(self, Self::Codec(_))
    }

    /// Returns true if the backing store failed.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Codec(_) => false,
            Self::Storage(e) => matches!(e, StorageError::Io(_) | StorageError::Locked(_)),
        }
    }
}

/// Result type alias for link operations.
pub type LinkResult<T> = Result<T, LinkError>;
