//! Mock item store for testing.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::{EventLog, StorageEvent};
use crate::catalog::{CatalogError, CatalogItem, ItemStore};

/// In-memory implementation of the ItemStore trait.
///
/// Provides controllable behavior for testing:
/// - Assign ids in insertion order, like an auto-increment column
/// - Record saves and deletes in an event log that can be shared with
///   [`MockAssetStorage`](super::MockAssetStorage) to assert ordering
/// - Simulate write failures
///
/// # Example
///
/// ```rust,ignore
/// use comicshelf_core::testing::{MockAssetStorage, MockItemStore, StorageEvent};
///
/// let store = Arc::new(MockItemStore::new());
/// let storage = Arc::new(MockAssetStorage::sharing_events(store.events()));
///
/// // ... run a catalog operation ...
///
/// assert_eq!(store.recorded_events(), vec![
///     StorageEvent::Saved(1),
///     StorageEvent::Deleted("/files/old.png".to_string()),
/// ]);
/// ```
#[derive(Debug)]
pub struct MockItemStore {
    items: RwLock<BTreeMap<i64, CatalogItem>>,
    next_id: RwLock<i64>,
    events: EventLog,
    fail_saves: RwLock<bool>,
}

impl Default for MockItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockItemStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            next_id: RwLock::new(1),
            events: Arc::new(RwLock::new(Vec::new())),
            fail_saves: RwLock::new(false),
        }
    }

    /// Handle to the event log, for sharing with other mocks.
    pub fn events(&self) -> EventLog {
        Arc::clone(&self.events)
    }

    /// Every event recorded so far, in order.
    pub fn recorded_events(&self) -> Vec<StorageEvent> {
        self.events.read().unwrap().clone()
    }

    /// Clear the event log.
    pub fn clear_events(&self) {
        self.events.write().unwrap().clear();
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.events
            .read()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, StorageEvent::Saved(_)))
            .count()
    }

    /// Make every following save fail with a database error.
    pub fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.write().unwrap() = fail;
    }

    fn record(&self, event: StorageEvent) {
        self.events.write().unwrap().push(event);
    }
}

impl ItemStore for MockItemStore {
    fn get(&self, id: i64) -> Result<Option<CatalogItem>, CatalogError> {
        Ok(self.items.read().unwrap().get(&id).cloned())
    }

    fn save(&self, mut item: CatalogItem) -> Result<CatalogItem, CatalogError> {
        if *self.fail_saves.read().unwrap() {
            return Err(CatalogError::Database("mock save failure".to_string()));
        }

        let mut items = self.items.write().unwrap();
        let id = match item.id {
            Some(id) if items.contains_key(&id) => id,
            Some(id) => return Err(CatalogError::NotFound(id)),
            None => {
                let mut next_id = self.next_id.write().unwrap();
                let id = *next_id;
                *next_id += 1;
                id
            }
        };
        item.id = Some(id);
        items.insert(id, item.clone());
        drop(items);

        self.record(StorageEvent::Saved(id));
        Ok(item)
    }

    fn delete(&self, id: i64) -> Result<(), CatalogError> {
        if self.items.write().unwrap().remove(&id).is_none() {
            return Err(CatalogError::NotFound(id));
        }
        self.record(StorageEvent::Removed(id));
        Ok(())
    }

    fn exists(&self, id: i64) -> Result<bool, CatalogError> {
        Ok(self.items.read().unwrap().contains_key(&id))
    }

    fn all(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        Ok(self.items.read().unwrap().values().cloned().collect())
    }
}
