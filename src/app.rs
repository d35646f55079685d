//! Explicit dependency bundle for inventory operations.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::error::TransportError;
use crate::settings::Settings;
use crate::store::{
    FileNodeStore, JsonEntryFile, JsonNodeFile, LocalNodeRepository, NodeStore,
    SubscriptionRepository,
};
use crate::utils::http::{FeedFetcher, HttpFeedFetcher};

/// Everything a reconcile, sync or management call needs.
///
/// The context owns the inventory lock: every load, mutate and persist
/// sequence over the working document runs while holding it, so overlapping
/// triggers are serialized rather than rejected.
pub struct AppContext<F: FeedFetcher> {
    pub settings: Settings,
    pub store: Arc<dyn NodeStore>,
    pub local: Arc<dyn LocalNodeRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub fetcher: F,
    inventory_lock: Mutex<()>,
}

impl<F: FeedFetcher> AppContext<F> {
    pub fn new(
        settings: Settings,
        store: Arc<dyn NodeStore>,
        local: Arc<dyn LocalNodeRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        fetcher: F,
    ) -> Self {
        AppContext {
            settings,
            store,
            local,
            subscriptions,
            fetcher,
            inventory_lock: Mutex::new(()),
        }
    }

    /// Waits for exclusive access to the working inventory.
    pub async fn lock_inventory(&self) -> MutexGuard<'_, ()> {
        self.inventory_lock.lock().await
    }
}

impl AppContext<HttpFeedFetcher> {
    /// File-backed collaborators and an HTTP fetcher, all taken from `settings`.
    pub fn from_settings(settings: Settings) -> Result<Self, TransportError> {
        let fetcher = HttpFeedFetcher::new(settings.fetch_timeout(), &settings.fetch.user_agent)?;
        let store = Arc::new(FileNodeStore::new(settings.store_nodes_path()));
        let local = Arc::new(JsonNodeFile::new(settings.local_nodes_path()));
        let subscriptions = Arc::new(JsonEntryFile::new(settings.subscriptions_path()));
        Ok(AppContext::new(settings, store, local, subscriptions, fetcher))
    }
}
