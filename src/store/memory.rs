use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use super::{normalize_entries, LocalNodeRepository, NodeStore, SubscriptionRepository};
use crate::error::{PersistenceError, StoreError};
use crate::models::{NodeRecord, RoutingClass, StoreNode, SubscriptionEntry};

fn poisoned() -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".to_string())
}

fn poisoned_document() -> PersistenceError {
    PersistenceError::io(
        Path::new("<memory>"),
        io::Error::other("memory document lock poisoned"),
    )
}

/// In-memory [`NodeStore`].
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    nodes: Mutex<Vec<StoreNode>>,
}

impl MemoryNodeStore {
    pub fn new(nodes: Vec<StoreNode>) -> Self {
        MemoryNodeStore {
            nodes: Mutex::new(nodes),
        }
    }

    /// Replaces the store content, as an external writer would.
    pub fn replace(&self, nodes: Vec<StoreNode>) {
        *self.nodes.lock().unwrap_or_else(PoisonError::into_inner) = nodes;
    }
}

impl NodeStore for MemoryNodeStore {
    fn list_nodes(&self) -> Result<Vec<StoreNode>, StoreError> {
        Ok(self.nodes.lock().map_err(|_| poisoned())?.clone())
    }

    fn update_routing(
        &self,
        id: &str,
        links: &BTreeMap<String, String>,
        routing: RoutingClass,
        _name: &str,
    ) -> Result<bool, StoreError> {
        let mut nodes = self.nodes.lock().map_err(|_| poisoned())?;
        match nodes.iter_mut().find(|node| node.uuid == id) {
            Some(node) => {
                node.links = links.clone();
                node.routing_type = Some(i64::from(routing.code()));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn rename(&self, id: &str, name: &str) -> Result<bool, StoreError> {
        let mut nodes = self.nodes.lock().map_err(|_| poisoned())?;
        match nodes.iter_mut().find(|node| node.uuid == id) {
            Some(node) => {
                node.custom_name = Some(name.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// In-memory [`LocalNodeRepository`] that counts saves.
#[derive(Debug, Default)]
pub struct MemoryNodeRepository {
    nodes: Mutex<Vec<NodeRecord>>,
    saves: Mutex<usize>,
}

impl MemoryNodeRepository {
    pub fn new(nodes: Vec<NodeRecord>) -> Self {
        MemoryNodeRepository {
            nodes: Mutex::new(nodes),
            saves: Mutex::new(0),
        }
    }

    /// Number of times the document has been written.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocalNodeRepository for MemoryNodeRepository {
    fn load(&self) -> Result<Vec<NodeRecord>, PersistenceError> {
        Ok(self.nodes.lock().map_err(|_| poisoned_document())?.clone())
    }

    fn save(&self, nodes: &[NodeRecord]) -> Result<(), PersistenceError> {
        let mut sorted = nodes.to_vec();
        sorted.sort_by_key(|node| node.sort_index);
        *self.nodes.lock().map_err(|_| poisoned_document())? = sorted;
        *self.saves.lock().map_err(|_| poisoned_document())? += 1;
        Ok(())
    }
}

/// In-memory [`SubscriptionRepository`].
#[derive(Debug, Default)]
pub struct MemoryEntryRepository {
    entries: Mutex<Vec<SubscriptionEntry>>,
}

impl MemoryEntryRepository {
    pub fn new(entries: Vec<SubscriptionEntry>) -> Self {
        MemoryEntryRepository {
            entries: Mutex::new(normalize_entries(entries)),
        }
    }
}

impl SubscriptionRepository for MemoryEntryRepository {
    fn load_entries(&self) -> Result<Vec<SubscriptionEntry>, PersistenceError> {
        Ok(self.entries.lock().map_err(|_| poisoned_document())?.clone())
    }

    fn save_entries(&self, entries: &[SubscriptionEntry]) -> Result<(), PersistenceError> {
        *self.entries.lock().map_err(|_| poisoned_document())? = normalize_entries(entries.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn poison<T: Send>(lock: &Mutex<T>) {
        let result = thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _guard = lock.lock().unwrap();
                    panic!("poisoning lock");
                })
                .join()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_poisoned_node_repository_reports_errors() {
        let repo = MemoryNodeRepository::new(Vec::new());
        poison(&repo.nodes);
        assert!(repo.load().is_err());
        assert!(repo.save(&[]).is_err());
        assert_eq!(repo.save_count(), 0);
    }

    #[test]
    fn test_poisoned_entry_repository_reports_errors() {
        let repo = MemoryEntryRepository::new(vec![SubscriptionEntry::new("a", "https://a")]);
        poison(&repo.entries);
        assert!(repo.load_entries().is_err());
        assert!(repo.save_entries(&[]).is_err());
    }

    #[test]
    fn test_poisoned_store_reports_errors() {
        let store = MemoryNodeStore::default();
        poison(&store.nodes);
        assert!(store.list_nodes().is_err());
        assert!(store.rename("x", "y").is_err());
    }
}
