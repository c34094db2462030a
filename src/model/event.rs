//! Data-change events emitted by the record-change notifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A transient data-change event.
///
/// Events are named `<collection>.<hook>`, e.g. `orders.afterCreate`.
/// The hub never persists them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name used for routing.
    pub name: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Arbitrary JSON payload, usually a record snapshot.
    pub payload: Value,
}

impl Event {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self::at(name, Utc::now(), payload)
    }

    /// Creates an event with an explicit timestamp.
    #[must_use]
    pub fn at(name: impl Into<String>, timestamp: DateTime<Utc>, payload: Value) -> Self {
        Self {
            name: name.into(),
            timestamp,
            payload,
        }
    }
}

/// Kind of record change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordEventKind {
    /// A record was created.
    AfterCreate,
    /// A record was updated.
    AfterUpdate,
    /// A record was deleted.
    AfterDelete,
}

impl RecordEventKind {
    /// Returns the hook suffix used in event names.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::AfterCreate => "afterCreate",
            Self::AfterUpdate => "afterUpdate",
            Self::AfterDelete => "afterDelete",
        }
    }
}

/// Builds the event name for a change to `collection`.
///
/// ```
/// use webhook_hub::model::{RecordEventKind, record_event_name};
///
/// assert_eq!(record_event_name("orders", RecordEventKind::AfterCreate), "orders.afterCreate");
/// ```
#[must_use]
pub fn record_event_name(collection: &str, kind: RecordEventKind) -> String {
    format!("{collection}.{}", kind.suffix())
}
