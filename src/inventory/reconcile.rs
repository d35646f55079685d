//! Merge of the authoritative store into the working inventory.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::models::{NodeRecord, Origin, StoreNode};

/// Output of [`reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    /// Merged inventory in ascending `sort_index` order.
    pub nodes: Vec<NodeRecord>,
    /// Whether `nodes` differs from the (sorted) input document.
    pub changed: bool,
}

/// Stable ascending sort by `sort_index`; equal indices keep input order.
pub fn sorted_by_index(nodes: &[NodeRecord]) -> Vec<NodeRecord> {
    let mut sorted = nodes.to_vec();
    sorted.sort_by_key(|node| node.sort_index);
    sorted
}

/// Merges a store snapshot into a local document snapshot.
///
/// Store nodes overwrite the mirrored fields of the record with the same id,
/// or are appended as new mirrors. Store-origin records whose id is gone from
/// the store are dropped. Unknown origin tags become [`Origin::Local`], and
/// duplicate ids keep the last record at the position of the first.
pub fn reconcile(store_nodes: &[StoreNode], local_nodes: &[NodeRecord]) -> Reconciled {
    let mut nodes: Vec<NodeRecord> = Vec::with_capacity(local_nodes.len() + store_nodes.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in local_nodes {
        let mut record = record.clone();
        if let Origin::Unknown(tag) = &record.origin {
            debug!("Node {} has unknown origin '{}', treating as local", record.id, tag);
            record.origin = Origin::Local;
        }
        match index.get(&record.id) {
            Some(&pos) => {
                warn!("Duplicate node id {} in local document, keeping the last one", record.id);
                nodes[pos] = record;
            }
            None => {
                index.insert(record.id.clone(), nodes.len());
                nodes.push(record);
            }
        }
    }

    let mut upstream: HashSet<&str> = HashSet::with_capacity(store_nodes.len());
    for store in store_nodes {
        upstream.insert(store.uuid.as_str());
        match index.get(&store.uuid) {
            Some(&pos) => {
                let record = &mut nodes[pos];
                if record.origin != Origin::Store && record.origin != Origin::Local {
                    warn!(
                        "Store node {} replaces a {} record with the same id",
                        store.uuid, record.origin
                    );
                }
                record.name = store.display_name().to_string();
                record.links = store.links.clone();
                record.routing_type = store.routing_class();
                record.region = Some(store.region_or_default().to_string());
                record.origin = Origin::Store;
                record.is_fixed = false;
            }
            None => {
                index.insert(store.uuid.clone(), nodes.len());
                nodes.push(NodeRecord::mirror_of(store));
            }
        }
    }

    nodes.retain(|node| node.origin != Origin::Store || upstream.contains(node.id.as_str()));
    let nodes = sorted_by_index(&nodes);
    let changed = nodes != sorted_by_index(local_nodes);

    Reconciled { nodes, changed }
}
