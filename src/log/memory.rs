//! In-memory log store.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::model::DeliveryLogEntry;

use super::{LogError, LogStore};

/// Keeps every entry in memory, in append order.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    entries: Mutex<Vec<DeliveryLogEntry>>,
    appended: Notify,
}

impl MemoryLogStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DeliveryLogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of all entries.
    #[must_use]
    pub fn entries(&self) -> Vec<DeliveryLogEntry> {
        self.lock().clone()
    }

    /// Returns the entries recorded for `webhook_id`.
    #[must_use]
    pub fn for_webhook(&self, webhook_id: &str) -> Vec<DeliveryLogEntry> {
        self.lock()
            .iter()
            .filter(|e| e.webhook_id == webhook_id)
            .cloned()
            .collect()
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Waits until at least `count` entries have been recorded.
    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.appended.notified();
            if self.len() >= count {
                return;
            }
            notified.await;
        }
    }
}

impl LogStore for MemoryLogStore {
    async fn append(&self, entry: DeliveryLogEntry) -> Result<(), LogError> {
        self.lock().push(entry);
        self.appended.notify_waiters();
        Ok(())
    }
}
