//! Subscription feed sync
//!
//! Feeds are fetched concurrently, each into its own report. Links from all
//! feeds are then merged into the subscription-origin part of the working
//! inventory in one locked load, merge and persist step.

use std::collections::{HashMap, HashSet};

use chrono::{SecondsFormat, Utc};
use futures::stream::{self, StreamExt};
use log::{info, warn};

use super::regenerate_locked;
use crate::app::AppContext;
use crate::error::InventoryError;
use crate::models::{
    FeedReport, NodeRecord, Origin, OverallStatus, SubscriptionEntry, SyncOutcome, SyncRequest,
    SyncStatus, SyncSummary,
};
use crate::parser::{extract_nodes_from_content, ExtractedLink};
use crate::utils::http::FeedFetcher;

/// An extracted link tagged with the feed it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedLink {
    pub source_id: String,
    pub link: ExtractedLink,
}

/// Result of [`merge_subscription_nodes`].
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionMerge {
    pub nodes: Vec<NodeRecord>,
    /// `(new, updated)` link counts per source id.
    pub per_source: HashMap<String, (usize, usize)>,
    pub summary: SyncSummary,
}

/// One unit of fetch work.
struct FeedTask {
    id: String,
    alias: String,
    url: String,
    note: String,
    temporary: bool,
}

impl FeedTask {
    fn from_entry(entry: &SubscriptionEntry) -> Self {
        FeedTask {
            id: entry.id.clone(),
            alias: entry.alias().to_string(),
            url: entry.url.clone(),
            note: entry.note.clone(),
            temporary: false,
        }
    }

    fn temporary(idx: usize, url: &str) -> Self {
        FeedTask {
            id: format!("temp-{}", idx),
            alias: format!("Temporary feed {}", idx + 1),
            url: url.to_string(),
            note: String::new(),
            temporary: true,
        }
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn build_tasks(entries: &[SubscriptionEntry], request: &SyncRequest) -> Vec<FeedTask> {
    let override_urls: Vec<&str> = request
        .urls_override
        .iter()
        .flatten()
        .map(|url| url.trim())
        .filter(|url| !url.is_empty())
        .collect();
    if !override_urls.is_empty() {
        return override_urls
            .into_iter()
            .enumerate()
            .map(|(idx, url)| FeedTask::temporary(idx, url))
            .collect();
    }

    match &request.selected_ids {
        Some(ids) if !ids.is_empty() => ids
            .iter()
            .filter_map(|id| entries.iter().find(|entry| &entry.id == id))
            .filter(|entry| entry.enabled)
            .map(FeedTask::from_entry)
            .collect(),
        _ => entries
            .iter()
            .filter(|entry| entry.enabled)
            .map(FeedTask::from_entry)
            .collect(),
    }
}

/// Fetches and extracts one feed. Failures end up in the report.
async fn fetch_feed<F: FeedFetcher>(
    fetcher: &F,
    task: FeedTask,
    trigger: &str,
) -> (FeedReport, Vec<SourcedLink>) {
    let mut report = FeedReport {
        id: task.id,
        alias: task.alias,
        url: task.url,
        note: task.note,
        status: SyncStatus::Pending,
        message: String::new(),
        fetched: 0,
        new: 0,
        updated: 0,
        errors: Vec::new(),
        trigger: trigger.to_string(),
        synced_at: None,
        temporary: task.temporary,
    };

    let url = report.url.trim().to_string();
    if url.is_empty() {
        report.status = SyncStatus::Error;
        report.message = "empty URL".to_string();
        return (report, Vec::new());
    }

    match fetcher.fetch(&url).await {
        Ok(content) => {
            let extracted = extract_nodes_from_content(&content);
            if extracted.is_empty() {
                report.status = SyncStatus::Empty;
                report.message = "feed is empty or has no usable links".to_string();
                return (report, Vec::new());
            }
            report.status = SyncStatus::Success;
            report.fetched = extracted.len();
            report.message = format!("parsed {} links", extracted.len());
            let links = extracted
                .into_iter()
                .map(|link| SourcedLink {
                    source_id: report.id.clone(),
                    link,
                })
                .collect();
            (report, links)
        }
        Err(e) => {
            warn!("Failed to fetch subscription '{}': {}", report.alias, e);
            report.status = SyncStatus::Error;
            report.message = format!("download failed: {}", e);
            report.errors.push(e.to_string());
            (report, Vec::new())
        }
    }
}

/// Merges freshly fetched links into the subscription-origin nodes.
///
/// Existing subscription nodes are matched by name: a match gets the link
/// under its protocol key and keeps its id and `sort_index`, an unseen name
/// becomes a new unclassified node. Afterwards every subscription node whose
/// name was not fetched is removed. Other origins pass through untouched.
pub fn merge_subscription_nodes(local: Vec<NodeRecord>, fetched: &[SourcedLink]) -> SubscriptionMerge {
    let mut nodes = local;
    let mut by_name: HashMap<String, usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.origin == Origin::Subscription)
        .map(|(pos, node)| (node.name.clone(), pos))
        .collect();
    let mut fetched_names: HashSet<&str> = HashSet::with_capacity(fetched.len());
    let mut per_source: HashMap<String, (usize, usize)> = HashMap::new();

    for item in fetched {
        let ExtractedLink {
            name,
            protocol,
            link,
        } = &item.link;
        fetched_names.insert(name.as_str());
        let counts = per_source.entry(item.source_id.clone()).or_default();

        match by_name.get(name) {
            Some(&pos) => {
                let node = &mut nodes[pos];
                node.links.insert(protocol.clone(), link.clone());
                node.sub_source_id = Some(item.source_id.clone());
                counts.1 += 1;
            }
            None => {
                by_name.insert(name.clone(), nodes.len());
                nodes.push(NodeRecord::new_subscription(
                    name.clone(),
                    protocol,
                    link.clone(),
                    Some(item.source_id.clone()),
                ));
                counts.0 += 1;
            }
        }
    }

    let before = nodes.len();
    nodes.retain(|node| {
        node.origin != Origin::Subscription || fetched_names.contains(node.name.as_str())
    });

    let summary = SyncSummary {
        new: per_source.values().map(|(new, _)| new).sum(),
        updated: per_source.values().map(|(_, updated)| updated).sum(),
        deleted: before - nodes.len(),
    };
    SubscriptionMerge {
        nodes,
        per_source,
        summary,
    }
}

/// Copies each configured feed's report onto its entry and saves the
/// entries. Temporary feeds have no entry.
///
/// The entries are reloaded here so edits made while feeds were downloading
/// survive. Callers hold the inventory lock.
fn stamp_entries<F: FeedFetcher>(
    ctx: &AppContext<F>,
    reports: &[FeedReport],
    synced_at: &str,
    trigger: &str,
) -> Result<(), InventoryError> {
    let mut entries = ctx.subscriptions.load_entries()?;
    let mut touched = false;
    for report in reports.iter().filter(|report| !report.temporary) {
        if let Some(entry) = entries.iter_mut().find(|entry| entry.id == report.id) {
            entry.last_status = Some(report.status);
            entry.last_message = Some(report.message.clone());
            entry.last_synced_at = Some(synced_at.to_string());
            entry.last_trigger = Some(trigger.to_string());
            touched = true;
        }
    }
    if touched {
        ctx.subscriptions.save_entries(&entries)?;
    }
    Ok(())
}

/// Runs one subscription sync.
///
/// Feed-level problems are reported per feed; only persistence failures are
/// returned as errors.
pub async fn sync_subscriptions<F: FeedFetcher>(
    ctx: &AppContext<F>,
    request: SyncRequest,
) -> Result<SyncOutcome, InventoryError> {
    let trigger = request.trigger.clone();
    let tasks = build_tasks(&ctx.subscriptions.load_entries()?, &request);
    if tasks.is_empty() {
        return Ok(SyncOutcome {
            status: OverallStatus::Error,
            message: "no enabled subscriptions".to_string(),
            reports: Vec::new(),
            summary: None,
            synced_at: None,
            triggered_by: trigger,
        });
    }

    info!("Syncing {} subscription feeds ({})", tasks.len(), trigger);
    let results: Vec<(FeedReport, Vec<SourcedLink>)> = stream::iter(tasks)
        .map(|task| fetch_feed(&ctx.fetcher, task, &trigger))
        .buffered(ctx.settings.max_concurrent_fetches())
        .collect()
        .await;

    let mut reports = Vec::with_capacity(results.len());
    let mut fetched = Vec::new();
    for (report, links) in results {
        reports.push(report);
        fetched.extend(links);
    }

    if fetched.is_empty() {
        let synced_at = now_rfc3339();
        for report in &mut reports {
            report.synced_at = Some(synced_at.clone());
        }
        {
            let _guard = ctx.lock_inventory().await;
            stamp_entries(ctx, &reports, &synced_at, &trigger)?;
        }

        let any_success = reports.iter().any(|r| r.status == SyncStatus::Success);
        return Ok(SyncOutcome {
            status: if any_success {
                OverallStatus::Warning
            } else {
                OverallStatus::Error
            },
            message: "no usable nodes fetched".to_string(),
            reports,
            summary: None,
            synced_at: Some(synced_at),
            triggered_by: trigger,
        });
    }

    let guard = ctx.lock_inventory().await;
    let local = ctx.local.load()?;
    let merge = merge_subscription_nodes(local, &fetched);
    ctx.local.save(&merge.nodes)?;
    regenerate_locked(ctx)?;

    let synced_at = now_rfc3339();
    for report in &mut reports {
        let (new, updated) = merge.per_source.get(&report.id).copied().unwrap_or_default();
        report.new = new;
        report.updated = updated;
        report.synced_at = Some(synced_at.clone());
        if report.status == SyncStatus::Success {
            report.message = if new == 0 && updated == 0 {
                "no changes".to_string()
            } else {
                format!("new {}, updated {}", new, updated)
            };
        }
    }
    stamp_entries(ctx, &reports, &synced_at, &trigger)?;
    drop(guard);

    let summary = merge.summary;
    let mut message = format!("sync complete: new {}, updated {}", summary.new, summary.updated);
    if summary.deleted > 0 {
        message.push_str(&format!(", cleaned {}", summary.deleted));
    }
    info!("{}", message);

    let all_succeeded = reports.iter().all(|r| r.status == SyncStatus::Success);
    Ok(SyncOutcome {
        status: if all_succeeded {
            OverallStatus::Success
        } else {
            OverallStatus::Warning
        },
        message,
        reports,
        summary: Some(summary),
        synced_at: Some(synced_at),
        triggered_by: trigger,
    })
}
