//! Inventory workflows
//!
//! Every function here that touches the working document either takes the
//! inventory lock itself or, for the `*_locked` variants, expects the caller
//! to hold it.

pub mod manage;
pub mod reconcile;
pub mod subscription_sync;

use log::info;

pub use manage::{
    add_callback_link, add_local_link, clear_subscription_nodes, delete_node, delete_protocol,
    rename_node, update_links, update_routing, LinkAdded, LinksChange, RoutingGroups,
};
pub use reconcile::{reconcile, sorted_by_index, Reconciled};
pub use subscription_sync::{
    merge_subscription_nodes, sync_subscriptions, SourcedLink, SubscriptionMerge,
};

use crate::app::AppContext;
use crate::error::InventoryError;
use crate::generator::{render, write_artifacts, Artifacts};
use crate::models::NodeRecord;
use crate::utils::http::FeedFetcher;

/// Reconciles the store into the working document and persists the result
/// when it changed.
pub async fn refresh_inventory<F: FeedFetcher>(
    ctx: &AppContext<F>,
) -> Result<Vec<NodeRecord>, InventoryError> {
    let _guard = ctx.lock_inventory().await;
    refresh_locked(ctx)
}

pub fn refresh_locked<F: FeedFetcher>(ctx: &AppContext<F>) -> Result<Vec<NodeRecord>, InventoryError> {
    let store_nodes = ctx.store.list_nodes()?;
    let local_nodes = ctx.local.load()?;
    let reconciled = reconcile(&store_nodes, &local_nodes);
    if reconciled.changed {
        info!(
            "Inventory reconciled with {} store nodes, saving {} nodes",
            store_nodes.len(),
            reconciled.nodes.len()
        );
        ctx.local.save(&reconciled.nodes)?;
    }
    Ok(reconciled.nodes)
}

/// Refreshes the inventory and rewrites every artifact from it.
pub async fn regenerate_artifacts<F: FeedFetcher>(
    ctx: &AppContext<F>,
) -> Result<Artifacts, InventoryError> {
    let _guard = ctx.lock_inventory().await;
    regenerate_locked(ctx)
}

pub fn regenerate_locked<F: FeedFetcher>(ctx: &AppContext<F>) -> Result<Artifacts, InventoryError> {
    let nodes = refresh_locked(ctx)?;
    let artifacts = render(&nodes);
    write_artifacts(
        &ctx.settings.output_dir(),
        &artifacts,
        ctx.settings.output.bundle_base64,
    )?;
    Ok(artifacts)
}
