//! Mock cover storage for testing.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use super::{EventLog, StorageEvent};
use crate::storage::{AssetStorage, StorageError};

/// Mock implementation of the AssetStorage trait.
///
/// Nothing touches the filesystem. Stores hand out `/files/mock-<n>.<ext>`
/// paths; stores and deletes are recorded, and can be made to fail.
#[derive(Debug)]
pub struct MockAssetStorage {
    events: EventLog,
    counter: RwLock<u64>,
    fail_stores: RwLock<bool>,
    fail_deletes: RwLock<bool>,
}

impl Default for MockAssetStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAssetStorage {
    /// Create a mock with its own event log.
    pub fn new() -> Self {
        Self::sharing_events(Arc::new(RwLock::new(Vec::new())))
    }

    /// Create a mock that records into an existing event log.
    pub fn sharing_events(events: EventLog) -> Self {
        Self {
            events,
            counter: RwLock::new(0),
            fail_stores: RwLock::new(false),
            fail_deletes: RwLock::new(false),
        }
    }

    /// Paths handed out by successful stores.
    pub fn recorded_stores(&self) -> Vec<String> {
        self.events
            .read()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                StorageEvent::Stored(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Paths passed to delete, including failed attempts.
    pub fn recorded_deletes(&self) -> Vec<String> {
        self.events
            .read()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                StorageEvent::Deleted(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn set_fail_stores(&self, fail: bool) {
        *self.fail_stores.write().unwrap() = fail;
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        *self.fail_deletes.write().unwrap() = fail;
    }
}

impl AssetStorage for MockAssetStorage {
    fn store(&self, _bytes: &[u8], original_name: &str) -> Result<String, StorageError> {
        let mut counter = self.counter.write().unwrap();
        *counter += 1;
        let name = match original_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => format!("mock-{}.{}", counter, ext),
            _ => format!("mock-{}", counter),
        };

        if *self.fail_stores.read().unwrap() {
            return Err(StorageError::WriteFailed {
                path: PathBuf::from(name),
                source: io::Error::other("mock store failure"),
            });
        }

        let path = format!("/files/{}", name);
        self.events
            .write()
            .unwrap()
            .push(StorageEvent::Stored(path.clone()));
        Ok(path)
    }

    fn delete(&self, relative_path: &str) -> Result<(), StorageError> {
        self.events
            .write()
            .unwrap()
            .push(StorageEvent::Deleted(relative_path.to_string()));

        if *self.fail_deletes.read().unwrap() {
            return Err(StorageError::DeleteFailed {
                path: PathBuf::from(relative_path),
                source: io::Error::other("mock delete failure"),
            });
        }
        Ok(())
    }
}
