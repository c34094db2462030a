//! Delivery logging.
//!
//! Every delivery attempt, outbound or inbound, produces one
//! [`DeliveryLogEntry`]. The [`DeliveryLogger`] hands entries to a
//! [`LogStore`] on a best-effort basis: a failing store is reported through
//! `tracing` and never affects the delivery that produced the entry.

mod file;
mod memory;
mod trace;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use file::JsonlLogStore;
pub use memory::MemoryLogStore;
pub use trace::{TARGET as TRACE_TARGET, TracingLogStore};

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::model::DeliveryLogEntry;

/// Errors that can occur while persisting log entries.
#[derive(Debug, Error)]
pub enum LogError {
    /// Failed to write the log.
    #[error("Failed to write delivery log: {0}")]
    Write(#[source] io::Error),

    /// Failed to read the log back.
    #[error("Failed to read delivery log: {0}")]
    Read(#[source] io::Error),

    /// Failed to encode or decode an entry.
    #[error("Invalid delivery log entry: {0}")]
    Json(#[from] serde_json::Error),

    /// The background writer did not complete.
    #[error("Delivery log writer failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Append-only storage for delivery log entries.
///
/// # Testing
///
/// Use [`MemoryLogStore`] in tests to inspect what was recorded.
pub trait LogStore: Send + Sync {
    /// Appends one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be persisted.
    fn append(
        &self,
        entry: DeliveryLogEntry,
    ) -> impl std::future::Future<Output = Result<(), LogError>> + Send;
}

/// Best-effort front end over a [`LogStore`].
#[derive(Debug)]
pub struct DeliveryLogger<L> {
    store: Arc<L>,
}

impl<L> Clone for DeliveryLogger<L> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<L: LogStore> DeliveryLogger<L> {
    /// Creates a logger writing to `store`.
    #[must_use]
    pub const fn new(store: Arc<L>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<L> {
        &self.store
    }

    /// Records one attempt. Store failures are logged and swallowed.
    pub async fn record(&self, entry: DeliveryLogEntry) {
        let webhook_id = entry.webhook_id.clone();
        let attempt = entry.retry_attempt;

        if let Err(e) = self.store.append(entry).await {
            tracing::warn!(%webhook_id, attempt, "Failed to record delivery attempt: {e}");
        }
    }
}
