//! Collaborator traits and their backends.
//!
//! The core talks to its host only through [`SettingsStore`] and
//! [`EntityDirectory`]. In-memory implementations live in `memory`; durable
//! backends belong to the host.

mod memory;
mod traits;

pub use memory::{InMemoryEntityDirectory, InMemorySettingsStore, InMemoryStores};
pub use traits::{EntityDirectory, SettingValue, SettingsStore, StorageError};
