//! Persistence collaborators.
//!
//! The inventory never touches storage directly: the authoritative node store,
//! the working node document and the subscription entry list are reached
//! through the traits below. File-backed implementations are the default;
//! in-memory ones back the tests and embedders that keep state elsewhere.

mod file;
mod memory;

use std::collections::BTreeMap;

pub use file::{FileNodeStore, JsonEntryFile, JsonNodeFile};
pub use memory::{MemoryEntryRepository, MemoryNodeRepository, MemoryNodeStore};

use crate::error::{PersistenceError, StoreError};
use crate::models::{NodeRecord, RoutingClass, StoreNode, SubscriptionEntry};

/// The authoritative, externally written node store.
pub trait NodeStore: Send + Sync {
    fn list_nodes(&self) -> Result<Vec<StoreNode>, StoreError>;

    /// Pushes a routing change for a store node. `Ok(false)` when the id is
    /// unknown to the store.
    fn update_routing(
        &self,
        id: &str,
        links: &BTreeMap<String, String>,
        routing: RoutingClass,
        name: &str,
    ) -> Result<bool, StoreError>;

    /// Sets the custom name of a store node. `Ok(false)` when the id is unknown.
    fn rename(&self, id: &str, name: &str) -> Result<bool, StoreError>;
}

/// The working inventory document.
pub trait LocalNodeRepository: Send + Sync {
    fn load(&self) -> Result<Vec<NodeRecord>, PersistenceError>;

    /// Replaces the whole document. Readers never observe a partial write.
    fn save(&self, nodes: &[NodeRecord]) -> Result<(), PersistenceError>;
}

/// The configured subscription feeds.
pub trait SubscriptionRepository: Send + Sync {
    fn load_entries(&self) -> Result<Vec<SubscriptionEntry>, PersistenceError>;
    fn save_entries(&self, entries: &[SubscriptionEntry]) -> Result<(), PersistenceError>;
}

/// Normalizes entries and renumbers their `order` from zero.
pub fn normalize_entries(entries: Vec<SubscriptionEntry>) -> Vec<SubscriptionEntry> {
    entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| entry.normalize(idx as i64))
        .collect()
}
