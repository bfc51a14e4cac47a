//! Comic catalog - item records, search and bulk import.
//!
//! Search runs in memory over the full collection returned by the store; the
//! store itself only needs key-based access.

mod filter;
mod import;
pub mod normalize;
mod request;
mod samples;
mod search;
mod service;
mod sqlite;
mod types;

pub use filter::{matches, SearchFilter};
pub use import::{import_from, ImportColumns};
pub use request::*;
pub use samples::sample_items;
pub use search::{find_all, search};
pub use service::CatalogService;
pub use sqlite::SqliteItemStore;
pub use types::*;

/// Trait for item persistence backends.
///
/// Implementations own identity assignment. Callers never cache items across
/// operations.
pub trait ItemStore: Send + Sync {
    /// Get an item by id.
    fn get(&self, id: i64) -> Result<Option<CatalogItem>, CatalogError>;

    /// Insert or update an item.
    ///
    /// Items without an id are inserted and returned with their new id.
    /// Items with an id replace the stored row, which must exist.
    fn save(&self, item: CatalogItem) -> Result<CatalogItem, CatalogError>;

    /// Permanently delete an item.
    fn delete(&self, id: i64) -> Result<(), CatalogError>;

    /// Check if an item exists.
    fn exists(&self, id: i64) -> Result<bool, CatalogError>;

    /// All items in ascending id order.
    fn all(&self) -> Result<Vec<CatalogItem>, CatalogError>;
}
