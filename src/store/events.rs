//! Record-change event stream.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::model::Event;

/// Fan-out channel of data-change events.
///
/// Publishing never blocks and never fails. Every subscriber gets its own
/// unbounded queue, so a slow subscriber delays its events but never loses
/// them. Events published while nobody is subscribed are dropped. A
/// subscription ends once every clone of the bus is gone.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<Event>>>>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes an event. Returns the number of subscribers it reached.
    ///
    /// Subscribers whose receiver was dropped are forgotten.
    pub fn publish(&self, event: Event) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }
}
