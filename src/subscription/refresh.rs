//! Keeps the subscription index in step with the configuration store.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::delivery::RetryRegistry;
use crate::model::Direction;
use crate::store::ConfigStore;

use super::SubscriptionIndex;

/// What a rebuild changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildSummary {
    /// Webhooks routed after the rebuild.
    pub webhooks: usize,
    /// Distinct event names routed after the rebuild.
    pub events: usize,
    /// Webhooks that were routed before and no longer are (deleted or disabled).
    pub removed: Vec<String>,
}

/// Rebuilds `index` from the enabled outbound webhooks in `config`.
pub fn refresh_once<C: ConfigStore + ?Sized>(config: &C, index: &SubscriptionIndex) -> RebuildSummary {
    let definitions = config.list_enabled(Direction::Outbound);
    let previous = index.rebuild(definitions.iter().map(|d| &**d));
    let current = index.snapshot();

    let summary = RebuildSummary {
        webhooks: current.webhook_ids().len(),
        events: current.event_count(),
        removed: previous
            .webhook_ids()
            .difference(current.webhook_ids())
            .cloned()
            .collect(),
    };

    tracing::info!(
        webhooks = summary.webhooks,
        events = summary.events,
        removed = summary.removed.len(),
        "Subscription index rebuilt"
    );

    summary
}

/// Builds the index now and rebuilds it on every configuration change.
///
/// The first rebuild happens before this function returns. Pending retries
/// of webhooks that drop out of the index are cancelled. The task runs until
/// the returned handle is aborted.
pub fn spawn_refresher<C>(
    config: Arc<C>,
    index: Arc<SubscriptionIndex>,
    retries: Arc<RetryRegistry>,
) -> JoinHandle<()>
where
    C: ConfigStore + 'static,
{
    // Subscribe first so a change racing the initial build is not lost.
    let mut changes = config.subscribe();
    refresh_once(config.as_ref(), &index);

    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let summary = refresh_once(config.as_ref(), &index);
            for webhook_id in &summary.removed {
                let cancelled = retries.cancel_webhook(webhook_id);
                if cancelled > 0 {
                    tracing::info!(webhook_id, cancelled, "Cancelled pending retries");
                }
            }
        }
    })
}
