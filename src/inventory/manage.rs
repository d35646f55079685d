//! Edits to the working inventory
//!
//! Each operation loads the document, applies one change, saves it and
//! rewrites the artifacts, all while holding the inventory lock. Store-origin
//! nodes are read-only here except for their name and routing class, which
//! are pushed to the store instead.

use std::collections::{BTreeMap, HashMap};

use log::{info, warn};
use serde::Deserialize;

use super::regenerate_locked;
use crate::app::AppContext;
use crate::error::ManageError;
use crate::models::{NodeRecord, Origin, RoutingClass};
use crate::parser::parse_link;
use crate::utils::http::FeedFetcher;

/// What an add operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAdded {
    pub id: String,
    /// True when the link joined an existing node of the same name.
    pub merged: bool,
}

/// What a link edit did to its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinksChange {
    Updated,
    /// The node had no links left and was removed.
    NodeRemoved,
}

/// Node ids per routing class, each list in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RoutingGroups {
    pub direct: Vec<String>,
    pub relay: Vec<String>,
    pub unclassified: Vec<String>,
}

fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ManageError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ManageError::MissingField(field))
    } else {
        Ok(value)
    }
}

/// Validates a link and works out its protocol key.
fn link_protocol(protocol: Option<&str>, link: &str) -> Result<String, ManageError> {
    let proxy = parse_link(link, "", None)?;
    Ok(match protocol.map(str::trim).filter(|p| !p.is_empty()) {
        Some(protocol) => protocol.to_string(),
        None => proxy.proxy_type().link_key().to_string(),
    })
}

fn find_index(nodes: &[NodeRecord], id: &str) -> Result<usize, ManageError> {
    nodes
        .iter()
        .position(|node| node.id == id)
        .ok_or_else(|| ManageError::NotFound(id.to_string()))
}

fn find_editable(nodes: &[NodeRecord], id: &str) -> Result<usize, ManageError> {
    let pos = find_index(nodes, id)?;
    if nodes[pos].origin == Origin::Store {
        return Err(ManageError::ReadOnly(id.to_string()));
    }
    Ok(pos)
}

fn persist<F: FeedFetcher>(ctx: &AppContext<F>, nodes: &[NodeRecord]) -> Result<(), ManageError> {
    ctx.local.save(nodes)?;
    regenerate_locked(ctx)?;
    Ok(())
}

async fn add_link<F, P>(
    ctx: &AppContext<F>,
    name: &str,
    protocol: Option<&str>,
    link: &str,
    can_merge: P,
) -> Result<LinkAdded, ManageError>
where
    F: FeedFetcher,
    P: Fn(&NodeRecord) -> bool,
{
    let name = require(name, "name")?;
    let link = require(link, "link")?;
    let protocol = link_protocol(protocol, link)?;

    let _guard = ctx.lock_inventory().await;
    let mut nodes = ctx.local.load()?;
    let added = match nodes.iter_mut().find(|node| node.name == name && can_merge(node)) {
        Some(node) => {
            node.links.insert(protocol.clone(), link.to_string());
            LinkAdded {
                id: node.id.clone(),
                merged: true,
            }
        }
        None => {
            let node = NodeRecord::new_local(name, &protocol, link);
            let id = node.id.clone();
            nodes.push(node);
            LinkAdded { id, merged: false }
        }
    };
    persist(ctx, &nodes)?;

    info!(
        "{} {} link for node '{}'",
        if added.merged { "Merged" } else { "Created" },
        protocol,
        name
    );
    Ok(added)
}

/// Adds a hand-entered link. It joins any non-store node with the same name,
/// otherwise a new local relay node is created.
///
/// `protocol` defaults to the link's own protocol key.
pub async fn add_local_link<F: FeedFetcher>(
    ctx: &AppContext<F>,
    name: &str,
    protocol: Option<&str>,
    link: &str,
) -> Result<LinkAdded, ManageError> {
    add_link(ctx, name, protocol, link, |node| node.origin != Origin::Store).await
}

/// Adds a link reported by a provisioning callback. Only local nodes are
/// merge targets.
pub async fn add_callback_link<F: FeedFetcher>(
    ctx: &AppContext<F>,
    name: &str,
    protocol: Option<&str>,
    link: &str,
) -> Result<LinkAdded, ManageError> {
    add_link(ctx, name, protocol, link, |node| node.origin == Origin::Local).await
}

pub async fn rename_node<F: FeedFetcher>(
    ctx: &AppContext<F>,
    id: &str,
    name: &str,
) -> Result<(), ManageError> {
    let id = require(id, "id")?;
    let name = require(name, "name")?;

    let _guard = ctx.lock_inventory().await;
    let mut nodes = ctx.local.load()?;
    let pos = find_index(&nodes, id)?;
    if nodes[pos].origin == Origin::Store {
        if !ctx.store.rename(id, name)? {
            return Err(ManageError::NotFound(id.to_string()));
        }
        regenerate_locked(ctx)?;
    } else {
        nodes[pos].name = name.to_string();
        persist(ctx, &nodes)?;
    }
    Ok(())
}

/// Replaces the links of a non-store node. Blank links are dropped; a node
/// left without links is deleted.
pub async fn update_links<F: FeedFetcher>(
    ctx: &AppContext<F>,
    id: &str,
    links: BTreeMap<String, String>,
) -> Result<LinksChange, ManageError> {
    let _guard = ctx.lock_inventory().await;
    let mut nodes = ctx.local.load()?;
    let pos = find_editable(&nodes, id)?;

    let cleaned: BTreeMap<String, String> = links
        .into_iter()
        .filter(|(_, link)| !link.trim().is_empty())
        .collect();
    let change = if cleaned.is_empty() {
        nodes.remove(pos);
        LinksChange::NodeRemoved
    } else {
        nodes[pos].links = cleaned;
        LinksChange::Updated
    };
    persist(ctx, &nodes)?;
    Ok(change)
}

pub async fn delete_node<F: FeedFetcher>(ctx: &AppContext<F>, id: &str) -> Result<(), ManageError> {
    let _guard = ctx.lock_inventory().await;
    let mut nodes = ctx.local.load()?;
    let pos = find_editable(&nodes, id)?;
    let removed = nodes.remove(pos);
    persist(ctx, &nodes)?;
    info!("Deleted node '{}'", removed.name);
    Ok(())
}

/// Removes one protocol link from a non-store node, deleting the node when
/// it was the last one.
pub async fn delete_protocol<F: FeedFetcher>(
    ctx: &AppContext<F>,
    id: &str,
    protocol: &str,
) -> Result<LinksChange, ManageError> {
    let _guard = ctx.lock_inventory().await;
    let mut nodes = ctx.local.load()?;
    let pos = find_editable(&nodes, id)?;
    if nodes[pos].links.remove(protocol).is_none() {
        return Err(ManageError::NotFound(format!("{} link of {}", protocol, id)));
    }

    let change = if nodes[pos].links.is_empty() {
        nodes.remove(pos);
        LinksChange::NodeRemoved
    } else {
        LinksChange::Updated
    };
    persist(ctx, &nodes)?;
    Ok(change)
}

/// Removes every subscription-origin node and returns how many went.
pub async fn clear_subscription_nodes<F: FeedFetcher>(ctx: &AppContext<F>) -> Result<usize, ManageError> {
    let _guard = ctx.lock_inventory().await;
    let mut nodes = ctx.local.load()?;
    let before = nodes.len();
    nodes.retain(|node| node.origin != Origin::Subscription);
    let deleted = before - nodes.len();
    if deleted > 0 {
        persist(ctx, &nodes)?;
        info!("Cleared {} subscription nodes", deleted);
    }
    Ok(deleted)
}

/// Applies a new ordering and classification.
///
/// Ids are numbered from zero across the direct, relay and unclassified
/// lists in that order; unknown ids are skipped. A changed class on a store
/// node is pushed to the store first and only kept when the store accepts it.
pub async fn update_routing<F: FeedFetcher>(
    ctx: &AppContext<F>,
    groups: &RoutingGroups,
) -> Result<(), ManageError> {
    let _guard = ctx.lock_inventory().await;
    let mut nodes = ctx.local.load()?;
    let positions: HashMap<String, usize> = nodes
        .iter()
        .enumerate()
        .map(|(pos, node)| (node.id.clone(), pos))
        .collect();

    let ordered = [
        (RoutingClass::Direct, &groups.direct),
        (RoutingClass::Relay, &groups.relay),
        (RoutingClass::Unclassified, &groups.unclassified),
    ];
    let mut next_index = 0;
    for (class, ids) in ordered {
        for id in ids {
            let Some(&pos) = positions.get(id) else {
                continue;
            };
            let node = &mut nodes[pos];
            node.sort_index = next_index;
            next_index += 1;

            if node.routing_type == class {
                continue;
            }
            if node.origin == Origin::Store {
                match ctx.store.update_routing(&node.id, &node.links, class, &node.name) {
                    Ok(true) => node.routing_type = class,
                    Ok(false) => warn!("Store has no node {}, routing left unchanged", node.id),
                    Err(e) => warn!("Failed to update store routing of {}: {}", node.id, e),
                }
            } else {
                node.routing_type = class;
            }
        }
    }

    persist(ctx, &nodes)
}
