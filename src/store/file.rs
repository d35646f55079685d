use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, warn};
use serde::Deserialize;

use super::{normalize_entries, LocalNodeRepository, NodeStore, SubscriptionRepository};
use crate::error::{PersistenceError, StoreError};
use crate::models::{NodeRecord, RoutingClass, StoreNode, SubscriptionEntry};
use crate::utils::file::{read_json, write_json};

/// [`NodeStore`] kept in a JSON array of store nodes.
#[derive(Debug)]
pub struct FileNodeStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileNodeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileNodeStore {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modify<F>(&self, id: &str, apply: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut StoreNode),
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;
        let mut nodes = self.list_nodes()?;
        let Some(node) = nodes.iter_mut().find(|node| node.uuid == id) else {
            return Ok(false);
        };
        apply(node);
        write_json(&self.path, &nodes)?;
        Ok(true)
    }
}

impl NodeStore for FileNodeStore {
    fn list_nodes(&self) -> Result<Vec<StoreNode>, StoreError> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    fn update_routing(
        &self,
        id: &str,
        links: &BTreeMap<String, String>,
        routing: RoutingClass,
        name: &str,
    ) -> Result<bool, StoreError> {
        self.modify(id, |node| {
            node.links = links.clone();
            node.routing_type = Some(i64::from(routing.code()));
            if node.display_name() != name {
                node.custom_name = Some(name.to_string());
            }
        })
    }

    fn rename(&self, id: &str, name: &str) -> Result<bool, StoreError> {
        self.modify(id, |node| node.custom_name = Some(name.to_string()))
    }
}

/// [`LocalNodeRepository`] kept in `nodes.json`.
///
/// Nodes are written sorted by `sort_index`. A missing file reads as an empty
/// inventory; a corrupt one is an error so it never gets overwritten blindly.
#[derive(Debug, Clone)]
pub struct JsonNodeFile {
    path: PathBuf,
}

impl JsonNodeFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonNodeFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalNodeRepository for JsonNodeFile {
    fn load(&self) -> Result<Vec<NodeRecord>, PersistenceError> {
        let nodes: Option<Vec<NodeRecord>> = read_json(&self.path)?;
        if nodes.is_none() {
            debug!("No node document at {}, starting empty", self.path.display());
        }
        Ok(nodes.unwrap_or_default())
    }

    fn save(&self, nodes: &[NodeRecord]) -> Result<(), PersistenceError> {
        let mut sorted = nodes.to_vec();
        sorted.sort_by_key(|node| node.sort_index);
        write_json(&self.path, &sorted)
    }
}

/// On-disk entry: either a full object or, in older documents, a bare URL.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Url(String),
    Entry(SubscriptionEntry),
}

/// [`SubscriptionRepository`] kept in `subscriptions.json`.
#[derive(Debug, Clone)]
pub struct JsonEntryFile {
    path: PathBuf,
}

impl JsonEntryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonEntryFile { path: path.into() }
    }
}

impl SubscriptionRepository for JsonEntryFile {
    fn load_entries(&self) -> Result<Vec<SubscriptionEntry>, PersistenceError> {
        let stored: Vec<StoredEntry> = read_json(&self.path)?.unwrap_or_default();
        let entries = stored
            .into_iter()
            .filter_map(|stored| match stored {
                StoredEntry::Entry(entry) => Some(entry),
                StoredEntry::Url(url) if !url.trim().is_empty() => {
                    Some(SubscriptionEntry::new("", url))
                }
                StoredEntry::Url(_) => {
                    warn!("Ignoring blank subscription entry in {}", self.path.display());
                    None
                }
            })
            .collect();
        Ok(normalize_entries(entries))
    }

    fn save_entries(&self, entries: &[SubscriptionEntry]) -> Result<(), PersistenceError> {
        write_json(&self.path, &normalize_entries(entries.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Origin;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_node_file_round_trip_sorted() {
        let dir = tempdir().unwrap();
        let repo = JsonNodeFile::new(dir.path().join("nodes.json"));
        assert!(repo.load().unwrap().is_empty());

        let mut late = NodeRecord::new_local("late", "vless", "vless://a@b:1");
        late.sort_index = 5;
        let mut early = NodeRecord::new_local("early", "vless", "vless://a@c:1");
        early.sort_index = 1;
        repo.save(&[late, early]).unwrap();

        let names: Vec<_> = repo.load().unwrap().into_iter().map(|n| n.name).collect();
        assert_eq!(names, vec!["early", "late"]);
    }

    #[test]
    fn test_node_file_corrupt_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.json");
        fs::write(&path, "[{").unwrap();
        assert!(JsonNodeFile::new(&path).load().is_err());
    }

    #[test]
    fn test_entries_accept_legacy_urls() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subscriptions.json");
        fs::write(
            &path,
            r#"[" https://a.example/sub ", {"id":"x","name":"B","url":"https://b.example/sub","enabled":false}, ""]"#,
        )
        .unwrap();
        let repo = JsonEntryFile::new(&path);
        let entries = repo.load_entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url, "https://a.example/sub");
        assert_eq!(entries[0].order, 0);
        assert_eq!(entries[1].id, "x");
        assert!(!entries[1].enabled);
        assert_eq!(entries[1].order, 1);

        repo.save_entries(&entries).unwrap();
        assert_eq!(repo.load_entries().unwrap(), entries);
    }

    #[test]
    fn test_file_store_updates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(
            &path,
            r#"[{"uuid":"s1","name":"tokyo","region":"🇯🇵","links":{"vless":"vless://a@b:1"}}]"#,
        )
        .unwrap();
        let store = FileNodeStore::new(&path);

        assert!(store.rename("s1", "Tokyo 1").unwrap());
        assert!(!store.rename("missing", "x").unwrap());
        assert!(store
            .update_routing("s1", &BTreeMap::new(), RoutingClass::Direct, "Tokyo 1")
            .unwrap());

        let nodes = store.list_nodes().unwrap();
        assert_eq!(nodes[0].display_name(), "Tokyo 1");
        assert_eq!(nodes[0].routing_class(), RoutingClass::Direct);
        assert_eq!(NodeRecord::mirror_of(&nodes[0]).origin, Origin::Store);
    }
}
