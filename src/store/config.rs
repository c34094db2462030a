//! Webhook configuration store.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;

use crate::model::{Direction, WebhookDefinition};

/// Source of webhook definitions.
///
/// The hub only reads from it. Writers bump a change generation that
/// readers observe through [`subscribe`](Self::subscribe).
pub trait ConfigStore: Send + Sync {
    /// Returns all enabled definitions with the given direction.
    fn list_enabled(&self, direction: Direction) -> Vec<Arc<WebhookDefinition>>;

    /// Returns a definition by id, enabled or not.
    fn get(&self, id: &str) -> Option<Arc<WebhookDefinition>>;

    /// Returns a receiver that is notified after every change.
    fn subscribe(&self) -> watch::Receiver<u64>;
}

/// In-memory [`ConfigStore`] with CRUD operations.
///
/// Every mutation publishes a new change generation.
#[derive(Debug)]
pub struct MemoryConfigStore {
    definitions: RwLock<BTreeMap<String, Arc<WebhookDefinition>>>,
    changes: watch::Sender<u64>,
}

impl Default for MemoryConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConfigStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            definitions: RwLock::new(BTreeMap::new()),
            changes,
        }
    }

    /// Creates a store seeded with `definitions`.
    #[must_use]
    pub fn with_definitions(definitions: impl IntoIterator<Item = WebhookDefinition>) -> Self {
        let store = Self::new();
        {
            let mut map = store.write();
            for definition in definitions {
                map.insert(definition.id.clone(), Arc::new(definition));
            }
        }
        store
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Arc<WebhookDefinition>>> {
        self.definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Arc<WebhookDefinition>>> {
        self.definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.changes.send_modify(|generation| *generation += 1);
    }

    /// Creates or replaces a definition. Returns the previous one, if any.
    pub fn upsert(&self, definition: WebhookDefinition) -> Option<Arc<WebhookDefinition>> {
        let previous = self
            .write()
            .insert(definition.id.clone(), Arc::new(definition));
        self.notify();
        previous
    }

    /// Deletes a definition. Returns it if it existed.
    pub fn remove(&self, id: &str) -> Option<Arc<WebhookDefinition>> {
        let removed = self.write().remove(id);
        if removed.is_some() {
            self.notify();
        }
        removed
    }

    /// Enables or disables a definition. Returns false if `id` is unknown.
    pub fn set_enabled(&self, id: &str, enabled: bool) -> bool {
        {
            let mut map = self.write();
            let Some(existing) = map.get(id) else {
                return false;
            };
            let definition = existing.as_ref().clone().with_enabled(enabled);
            map.insert(id.to_string(), Arc::new(definition));
        }
        self.notify();
        true
    }

    /// Replaces the whole definition set in one step.
    pub fn replace_all(&self, definitions: impl IntoIterator<Item = WebhookDefinition>) {
        let fresh = definitions
            .into_iter()
            .map(|d| (d.id.clone(), Arc::new(d)))
            .collect();
        *self.write() = fresh;
        self.notify();
    }

    /// Returns every definition, enabled or not.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<WebhookDefinition>> {
        self.read().values().cloned().collect()
    }

    /// Current change generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        *self.changes.borrow()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn list_enabled(&self, direction: Direction) -> Vec<Arc<WebhookDefinition>> {
        self.read()
            .values()
            .filter(|d| d.enabled && d.direction == direction)
            .cloned()
            .collect()
    }

    fn get(&self, id: &str) -> Option<Arc<WebhookDefinition>> {
        self.read().get(id).cloned()
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}
