//! # review-links
//!
//! A bidirectional link graph between review requests (pull requests), kept
//! on top of a plain key-value settings store that knows nothing about
//! relations, transactions, or referential integrity.
//!
//! ## Core Concepts
//!
//! - **EntityRef**: identity of a review request (container id + entity id)
//! - **Link**: a `TO`, `FROM`, or `BIDIRECTIONAL` edge from a root to a target
//! - **Adjacency list**: the encoded links of one root, stored under `"{container}#{entity}"`
//! - **LinkedEntity**: the manager that creates, splits, and removes links on
//!   both endpoints
//!
//! ## Usage
//!
//! ```rust
//! use review_links::{Direction, EntityRef, InMemoryStores};
//!
//! let stores = InMemoryStores::new();
//! let a = EntityRef::new(1, 10);
//! let b = EntityRef::new(1, 11);
//! stores.directory.register(a).unwrap();
//! stores.directory.register(b).unwrap();
//!
//! let graph = stores.graph();
//! graph.linked(a).create_link(b, Direction::To).unwrap();
//!
//! let mirror = graph.linked(b).get_by_target(&a).unwrap().unwrap();
//! assert_eq!(mirror.direction, Direction::From);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adjacency;
pub mod codec;
pub mod direction;
pub mod entity;
pub mod error;
pub mod link;
pub mod linked;
pub mod reconcile;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use adjacency::AdjacencyStore;
pub use direction::{plan_create, plan_remove, CreatePlan, Direction, RemovePlan};
pub use entity::EntityRef;
pub use error::{CodecError, LinkError, LinkResult, ValidationError};
pub use link::{Link, LinkId, LinkSet};
pub use linked::{LinkGraph, LinkedEntity};
pub use reconcile::{MirrorFinding, PurgeReport, ReconcileMode, ReconcileReport};
pub use storage::{
    EntityDirectory, InMemoryEntityDirectory, InMemorySettingsStore, InMemoryStores,
    SettingValue, SettingsStore, StorageError,
};
