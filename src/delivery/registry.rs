//! Cancellable registry of scheduled retries.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;

type Pending = HashMap<String, HashMap<u64, AbortHandle>>;

/// Tracks retry timers per webhook so they can be cancelled.
///
/// A retry is pending from [`schedule`](Self::schedule) until its timer
/// fires. Once the timer fires the retry is released from the registry and
/// runs to completion, so an attempt that has started is never cut short
/// and always gets its log entry.
///
/// After [`close`](Self::close) no new retries are accepted.
#[derive(Debug, Default)]
pub struct RetryRegistry {
    next_ticket: AtomicU64,
    closed: AtomicBool,
    pending: Mutex<Pending>,
}

impl RetryRegistry {
    /// Creates an empty, open registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `task` for `webhook_id` after `delay`.
    ///
    /// Returns false, without scheduling anything, once the registry is closed.
    pub fn schedule<F>(self: &Arc<Self>, webhook_id: &str, delay: Duration, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(self);
        let id = webhook_id.to_string();

        // Holding the lock across spawn keeps the timer from releasing its
        // ticket before the handle is recorded.
        let mut pending = self.lock();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if registry.release(&id, ticket) {
                task.await;
            }
        });
        pending
            .entry(webhook_id.to_string())
            .or_default()
            .insert(ticket, handle.abort_handle());
        true
    }

    /// Removes a fired timer. Returns false if it was cancelled meanwhile.
    fn release(&self, webhook_id: &str, ticket: u64) -> bool {
        let mut pending = self.lock();
        let Some(tickets) = pending.get_mut(webhook_id) else {
            return false;
        };
        let released = tickets.remove(&ticket).is_some();
        if tickets.is_empty() {
            pending.remove(webhook_id);
        }
        released
    }

    /// Cancels every pending retry of `webhook_id`. Returns how many were cancelled.
    pub fn cancel_webhook(&self, webhook_id: &str) -> usize {
        let tickets = self.lock().remove(webhook_id).unwrap_or_default();
        for handle in tickets.values() {
            handle.abort();
        }
        tickets.len()
    }

    /// Closes the registry and cancels all pending retries.
    ///
    /// Returns how many were cancelled.
    pub fn close(&self) -> usize {
        self.closed.store(true, Ordering::Release);
        let drained = std::mem::take(&mut *self.lock());
        let mut cancelled = 0;
        for handle in drained.values().flat_map(HashMap::values) {
            handle.abort();
            cancelled += 1;
        }
        cancelled
    }

    /// Number of pending retries for `webhook_id`.
    #[must_use]
    pub fn pending(&self, webhook_id: &str) -> usize {
        self.lock().get(webhook_id).map_or(0, HashMap::len)
    }

    /// Number of pending retries across all webhooks.
    #[must_use]
    pub fn pending_total(&self) -> usize {
        self.lock().values().map(HashMap::len).sum()
    }

    /// Returns true once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
