//! Target record store used by the inbound path.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{Event, RecordEventKind, record_event_name};

use super::EventBus;

/// A stored record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Generated record id.
    pub id: String,
    /// Collection the record belongs to.
    pub collection: String,
    /// Field values as supplied by the caller.
    pub values: Map<String, Value>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Record {
    /// Returns the record as a flat JSON object: its fields plus `id` and `created`.
    #[must_use]
    pub fn to_snapshot(&self) -> Value {
        let mut snapshot = self.values.clone();
        snapshot.insert("id".to_string(), Value::String(self.id.clone()));
        snapshot.insert(
            "created".to_string(),
            Value::String(self.created_at.to_rfc3339()),
        );
        Value::Object(snapshot)
    }
}

/// Errors from the record store.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The collection name is not acceptable.
    #[error("Invalid collection name '{0}'")]
    InvalidCollection(String),

    /// The store refused the values.
    #[error("Record rejected: {0}")]
    Rejected(String),
}

/// Generic create interface over named collections.
pub trait RecordStore: Send + Sync {
    /// Creates a record in `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if the collection or values are rejected.
    fn create(
        &self,
        collection: &str,
        values: Map<String, Value>,
    ) -> impl std::future::Future<Output = Result<Record, RecordError>> + Send;
}

/// In-memory [`RecordStore`].
///
/// Collection names must be non-empty and made of ASCII letters, digits and
/// underscores. The `id` field is assigned by the store and may not be
/// supplied. When built with [`with_notifier`](Self::with_notifier) every
/// create publishes a `<collection>.afterCreate` event carrying the record
/// snapshot.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    collections: RwLock<HashMap<String, Vec<Record>>>,
    notifier: Option<EventBus>,
}

impl MemoryRecordStore {
    /// Creates an empty store without change notifications.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that publishes record events to `bus`.
    #[must_use]
    pub fn with_notifier(bus: EventBus) -> Self {
        Self {
            collections: RwLock::default(),
            notifier: Some(bus),
        }
    }

    /// Returns all records in `collection`, oldest first.
    #[must_use]
    pub fn list(&self, collection: &str) -> Vec<Record> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn validate_collection(name: &str) -> Result<(), RecordError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(())
        } else {
            Err(RecordError::InvalidCollection(name.to_string()))
        }
    }
}

impl RecordStore for MemoryRecordStore {
    async fn create(&self, collection: &str, values: Map<String, Value>) -> Result<Record, RecordError> {
        Self::validate_collection(collection)?;
        if values.contains_key("id") {
            return Err(RecordError::Rejected("field 'id' is reserved".to_string()));
        }

        let record = Record {
            id: uuid::Uuid::new_v4().simple().to_string(),
            collection: collection.to_string(),
            values,
            created_at: Utc::now(),
        };

        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());

        if let Some(bus) = &self.notifier {
            let name = record_event_name(collection, RecordEventKind::AfterCreate);
            bus.publish(Event::new(name, record.to_snapshot()));
        }

        Ok(record)
    }
}
