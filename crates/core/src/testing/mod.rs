//! Testing utilities and mock implementations.
//!
//! This module provides in-memory implementations of the storage traits, so
//! catalog behavior can be tested without SQLite or a filesystem.
//!
//! # Example
//!
//! ```rust,ignore
//! use comicshelf_core::storage::AssetLifecycle;
//! use comicshelf_core::testing::{MockAssetStorage, MockItemStore};
//! use comicshelf_core::CatalogService;
//!
//! let store = Arc::new(MockItemStore::new());
//! let storage = Arc::new(MockAssetStorage::sharing_events(store.events()));
//! let service = CatalogService::new(store.clone(), AssetLifecycle::new(storage.clone()));
//! ```

mod mock_asset_storage;
mod mock_item_store;

pub use mock_asset_storage::MockAssetStorage;
pub use mock_item_store::MockItemStore;

use std::sync::{Arc, RwLock};

/// Something a mock store or storage did, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEvent {
    /// An item row was written.
    Saved(i64),
    /// An item row was removed.
    Removed(i64),
    /// A cover was stored at this path.
    Stored(String),
    /// A cover delete was attempted for this path.
    Deleted(String),
}

/// Event log shared between mocks.
pub type EventLog = Arc<RwLock<Vec<StorageEvent>>>;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::{CatalogItem, ItemRequest, ItemStatus, DEFAULT_MAX_TAGS};

    /// An item request with the required fields set.
    pub fn request(title: &str, publisher: &str) -> ItemRequest {
        ItemRequest::new(title, "1", publisher)
    }

    /// An unsaved item with the required fields set.
    pub fn item(title: &str, publisher: &str) -> CatalogItem {
        tagged_item(title, publisher, ItemStatus::Owned, &[])
    }

    /// An unsaved item with status and tags.
    pub fn tagged_item(
        title: &str,
        publisher: &str,
        status: ItemStatus,
        tags: &[&str],
    ) -> CatalogItem {
        let mut request = request(title, publisher);
        request.status = status;
        request.tags = tags.iter().map(|t| t.to_string()).collect();
        match request.into_item(DEFAULT_MAX_TAGS) {
            Ok(item) => item,
            Err(e) => panic!("invalid fixture item {:?}: {}", title, e),
        }
    }

    /// CSV with a header and `rows` valid rows, then one row with `last_status`.
    pub fn csv_with_trailing_status(rows: usize, last_status: &str) -> String {
        let mut csv = String::from("title,issue_number,publisher,status,tags\n");
        for i in 1..=rows {
            csv.push_str(&format!("Issue {},{},Image,OWNED,\"indie,ongoing\"\n", i, i));
        }
        csv.push_str(&format!("Trailing,{},Image,{},\n", rows + 1, last_status));
        csv
    }
}
