//! Log store backed by `tracing` alone.

use crate::model::DeliveryLogEntry;

use super::{LogError, LogStore};

/// Target of the events emitted by [`TracingLogStore`].
pub const TARGET: &str = "webhook_hub::delivery_log";

/// Emits each entry as one `info` event holding the serialized entry.
///
/// Nothing is retained, so memory stays flat however long the process runs.
/// Filter on [`TARGET`] to route or silence the entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogStore;

impl TracingLogStore {
    /// Creates the store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LogStore for TracingLogStore {
    async fn append(&self, entry: DeliveryLogEntry) -> Result<(), LogError> {
        let line = serde_json::to_string(&entry)?;
        tracing::info!(
            target: TARGET,
            webhook_id = %entry.webhook_id,
            attempt = entry.retry_attempt,
            "{line}"
        );
        Ok(())
    }
}
