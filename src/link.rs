//! Link records.
//!
//! A [`Link`] lives in exactly one adjacency list. Its [`LinkId`] is local to
//! that list: the mirror record on the other endpoint has its own id, and the
//! two are matched by target, never by id.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::direction::Direction;
use crate::entity::EntityRef;

/// Identifier of a link record within its adjacency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(Uuid);

impl LinkId {
    /// Creates a new random link ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a link ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LinkId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for LinkId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A directed or bidirectional edge from the list's root to `target`.
///
/// Only `direction` ever changes after creation.
///
/// # Examples
///
/// ```
/// use review_links::{Direction, EntityRef, Link};
///
/// let link = Link::new(EntityRef::new(1, 2), Direction::To);
/// assert_eq!(link.direction.inverse(), Direction::From);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// List-local identifier.
    pub id: LinkId,
    /// The other endpoint.
    pub target: EntityRef,
    /// Direction as seen from the list's root.
    pub direction: Direction,
}

impl Link {
    /// Creates a link with a fresh id.
    #[must_use]
    pub fn new(target: EntityRef, direction: Direction) -> Self {
        Self::with_id(LinkId::new(), target, direction)
    }

    /// Creates a link with a known id.
    #[must_use]
    pub const fn with_id(id: LinkId, target: EntityRef, direction: Direction) -> Self {
        Self {
            id,
            target,
            direction,
        }
    }
}

/// All live links of one root entity, as handed to a host for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSet {
    /// The entity whose list this is.
    pub root: EntityRef,
    /// Links whose targets still exist, in storage order.
    pub links: Vec<Link>,
}

impl LinkSet {
    /// Number of links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns true when the root has no live links.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
