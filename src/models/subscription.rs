//! Subscription feed entries and sync reports.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of the last sync of one feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    Success,
    Empty,
    Error,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Success => "success",
            SyncStatus::Empty => "empty",
            SyncStatus::Error => "error",
        };
        f.write_str(s)
    }
}

fn default_enabled() -> bool {
    true
}

/// A configured subscription feed (`subscriptions.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub note: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_status: Option<SyncStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    /// RFC 3339 timestamp of the last sync attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_trigger: Option<String>,
    #[serde(default)]
    pub order: i64,
}

impl SubscriptionEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        SubscriptionEntry {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            url: url.into(),
            note: String::new(),
            enabled: true,
            last_status: None,
            last_message: None,
            last_synced_at: None,
            last_trigger: None,
            order: 0,
        }
    }

    /// Trims the text fields and assigns an id when missing.
    pub fn normalize(mut self, order: i64) -> Self {
        if self.id.trim().is_empty() {
            self.id = uuid::Uuid::new_v4().to_string();
        }
        self.name = self.name.trim().to_string();
        self.url = self.url.trim().to_string();
        self.note = self.note.trim().to_string();
        self.order = order;
        self
    }

    /// Name shown in reports, falling back to the id.
    pub fn alias(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Per-feed result of one sync run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedReport {
    pub id: String,
    pub alias: String,
    pub url: String,
    pub note: String,
    pub status: SyncStatus,
    pub message: String,
    /// Number of links extracted from the feed body.
    pub fetched: usize,
    pub new: usize,
    pub updated: usize,
    pub errors: Vec<String>,
    pub trigger: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<String>,
    /// True for ad-hoc URLs that are not configured entries.
    #[serde(skip)]
    pub temporary: bool,
}

/// Overall verdict of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Success,
    Warning,
    Error,
}

/// Node counts produced by merging fetched links into the inventory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub new: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Result of [`sync_subscriptions`](crate::inventory::sync_subscriptions).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncOutcome {
    pub status: OverallStatus,
    pub message: String,
    pub reports: Vec<FeedReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SyncSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<String>,
    pub triggered_by: String,
}

/// What a sync run should fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// Restrict the run to these configured entries.
    pub selected_ids: Option<Vec<String>>,
    /// Fetch these ad-hoc URLs instead of configured entries.
    pub urls_override: Option<Vec<String>>,
    pub trigger: String,
}

impl Default for SyncRequest {
    fn default() -> Self {
        SyncRequest {
            selected_ids: None,
            urls_override: None,
            trigger: "manual".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_defaults() {
        let entry: SubscriptionEntry =
            serde_json::from_str(r#"{"id":"s1","url":"https://example.com/sub"}"#).unwrap();
        assert!(entry.enabled);
        assert_eq!(entry.alias(), "s1");
        assert_eq!(entry.last_status, None);
    }

    #[test]
    fn test_normalize_assigns_id_and_trims() {
        let entry: SubscriptionEntry =
            serde_json::from_str(r#"{"name":" Main ","url":" https://a/sub ","order":9}"#).unwrap();
        let entry = entry.normalize(2);
        assert!(!entry.id.is_empty());
        assert_eq!(entry.name, "Main");
        assert_eq!(entry.url, "https://a/sub");
        assert_eq!(entry.order, 2);
    }

    #[test]
    fn test_status_wire_format() {
        let mut entry = SubscriptionEntry::new("Main", "https://example.com/sub");
        entry.last_status = Some(SyncStatus::Empty);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["last_status"], "empty");
        assert_eq!(SyncStatus::Success.to_string(), "success");
    }
}
