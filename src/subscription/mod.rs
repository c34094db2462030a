//! Routing table from event name to subscribed outbound webhooks.
//!
//! The index is an immutable snapshot published behind a shared pointer.
//! [`SubscriptionIndex::rebuild`] builds a complete new map off to the side
//! and swaps it in with a single pointer replacement, so a concurrent
//! [`SubscriptionIndex::lookup`] sees either the old map or the new one,
//! never a partially built map.

mod refresh;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use refresh::{RebuildSummary, refresh_once, spawn_refresher};

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use crate::model::WebhookDefinition;

/// One published version of the routing table.
#[derive(Debug, Default)]
pub struct Snapshot {
    routes: HashMap<String, Vec<Arc<WebhookDefinition>>>,
    webhook_ids: BTreeSet<String>,
}

impl Snapshot {
    fn build<'a, I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = &'a WebhookDefinition>,
    {
        let mut snapshot = Self::default();

        for definition in definitions.into_iter().filter(|d| d.is_routable()) {
            let shared = Arc::new(definition.clone());
            for event in &definition.events {
                snapshot
                    .routes
                    .entry(event.clone())
                    .or_default()
                    .push(Arc::clone(&shared));
            }
            snapshot.webhook_ids.insert(definition.id.clone());
        }

        snapshot
    }

    /// Returns the webhooks subscribed to `event`.
    #[must_use]
    pub fn lookup(&self, event: &str) -> &[Arc<WebhookDefinition>] {
        self.routes.get(event).map_or(&[], Vec::as_slice)
    }

    /// Returns the ids of every routed webhook.
    #[must_use]
    pub const fn webhook_ids(&self) -> &BTreeSet<String> {
        &self.webhook_ids
    }

    /// Number of distinct event names with at least one subscriber.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.routes.len()
    }
}

/// In-memory subscription index.
///
/// Only enabled outbound webhooks are routed. Changes to the configuration
/// become visible after the next [`rebuild`](Self::rebuild).
///
/// # Example
///
/// ```
/// use webhook_hub::model::WebhookDefinition;
/// use webhook_hub::subscription::SubscriptionIndex;
/// use url::Url;
///
/// let index = SubscriptionIndex::new();
/// let hook = WebhookDefinition::outbound("w1", Url::parse("https://example.com").unwrap())
///     .with_events(["orders.afterCreate"]);
///
/// index.rebuild(&[hook]);
/// assert_eq!(index.lookup("orders.afterCreate").len(), 1);
/// assert!(index.lookup("orders.afterDelete").is_empty());
/// ```
#[derive(Debug, Default)]
pub struct SubscriptionIndex {
    current: RwLock<Arc<Snapshot>>,
}

impl SubscriptionIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the published routing table with one built from `definitions`.
    ///
    /// Disabled and inbound definitions are ignored. Returns the snapshot that
    /// was replaced.
    pub fn rebuild<'a, I>(&self, definitions: I) -> Arc<Snapshot>
    where
        I: IntoIterator<Item = &'a WebhookDefinition>,
    {
        let fresh = Arc::new(Snapshot::build(definitions));

        // The lock only guards the pointer swap; no reader ever sees the map mid-build.
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, fresh)
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    /// Returns the webhooks subscribed to `event` in the current snapshot.
    #[must_use]
    pub fn lookup(&self, event: &str) -> Vec<Arc<WebhookDefinition>> {
        self.snapshot().lookup(event).to_vec()
    }
}
