//! Catalog use cases.

use std::io::Read;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::{
    import, sample_items, search, CatalogError, CatalogItem, ItemRequest, ItemStatus, ItemStore, SearchFilter,
    DEFAULT_MAX_TAGS,
};
use crate::metrics;
use crate::storage::{AssetLifecycle, CoverUpload};

/// Runs catalog operations against an item store and cover storage.
///
/// Every call re-reads what it needs from the store; nothing is cached.
pub struct CatalogService {
    store: Arc<dyn ItemStore>,
    assets: AssetLifecycle,
    max_tags: usize,
}

impl CatalogService {
    pub fn new(store: Arc<dyn ItemStore>, assets: AssetLifecycle) -> Self {
        Self {
            store,
            assets,
            max_tags: DEFAULT_MAX_TAGS,
        }
    }

    pub fn with_max_tags(mut self, max_tags: usize) -> Self {
        self.max_tags = max_tags;
        self
    }

    pub fn max_tags(&self) -> usize {
        self.max_tags
    }

    /// Create an item, storing `cover` first when one is supplied.
    ///
    /// An uploaded cover takes precedence over `request.image_url`.
    pub fn create(
        &self,
        request: ItemRequest,
        cover: Option<&CoverUpload>,
    ) -> Result<CatalogItem, CatalogError> {
        let (request, uploaded) = self.prepare(request, cover)?;
        let item = request.into_item(self.max_tags)?;

        let saved = self.save_or_release(item, uploaded.as_deref())?;
        metrics::ITEMS_CREATED.with_label_values(&["api"]).inc();
        info!(id = ?saved.id, title = %saved.title, "Item created");
        Ok(saved)
    }

    /// Replace every editable field of an existing item.
    ///
    /// A cover that is no longer referenced after the save is deleted.
    pub fn update(
        &self,
        id: i64,
        request: ItemRequest,
        cover: Option<&CoverUpload>,
    ) -> Result<CatalogItem, CatalogError> {
        let existing = self.get(id)?;
        let (request, uploaded) = self.prepare(request, cover)?;

        let mut item = existing.clone();
        request.apply_to(&mut item, self.max_tags)?;
        let saved = self.save_or_release(item, uploaded.as_deref())?;

        self.assets
            .release_replaced(existing.image_url.as_deref(), saved.image_url.as_deref());
        info!(id, "Item updated");
        Ok(saved)
    }

    /// Change only the status of an item.
    pub fn update_status(&self, id: i64, status: ItemStatus) -> Result<CatalogItem, CatalogError> {
        let mut item = self.get(id)?;
        item.status = status;
        item.updated_at = Utc::now();

        let saved = self.store.save(item)?;
        info!(id, status = %status, "Item status changed");
        Ok(saved)
    }

    pub fn get(&self, id: i64) -> Result<CatalogItem, CatalogError> {
        self.store.get(id)?.ok_or(CatalogError::NotFound(id))
    }

    pub fn find_all(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        self.store.all()
    }

    /// Items matching `filter`, in store order.
    pub fn search(&self, filter: &SearchFilter) -> Result<Vec<CatalogItem>, CatalogError> {
        let items = self.store.all()?;
        let found: Vec<CatalogItem> = search(&items, filter).cloned().collect();
        debug!(scanned = items.len(), matched = found.len(), "Search complete");
        Ok(found)
    }

    pub fn wishlist(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        self.search(&SearchFilter::new().with_status(ItemStatus::Wishlist))
    }

    /// Import items from a CSV stream. See [`import::import_from`].
    pub fn import_csv<R: Read>(&self, input: R) -> Result<Vec<CatalogItem>, CatalogError> {
        import::import_from(input, self.store.as_ref(), self.max_tags)
    }

    /// Insert the sample items if the catalog has no items yet.
    ///
    /// Returns how many items were inserted.
    pub fn seed_samples_if_empty(&self) -> Result<usize, CatalogError> {
        if !self.store.all()?.is_empty() {
            debug!("Catalog not empty, skipping sample items");
            return Ok(0);
        }

        let mut seeded = 0;
        for request in sample_items() {
            self.store.save(request.into_item(self.max_tags)?)?;
            metrics::ITEMS_CREATED.with_label_values(&["seed"]).inc();
            seeded += 1;
        }
        info!(count = seeded, "Seeded sample items");
        Ok(seeded)
    }

    /// Delete an item and release its cover.
    pub fn delete(&self, id: i64) -> Result<(), CatalogError> {
        let existing = self.get(id)?;
        self.store.delete(id)?;

        self.assets.release(existing.image_url.as_deref());
        metrics::ITEMS_DELETED.inc();
        info!(id, "Item deleted");
        Ok(())
    }

    /// Validate the request and store its cover.
    ///
    /// Validation runs before the upload so a rejected request never leaves
    /// a file behind.
    fn prepare(
        &self,
        request: ItemRequest,
        cover: Option<&CoverUpload>,
    ) -> Result<(ItemRequest, Option<String>), CatalogError> {
        let mut request = request.cleaned();
        request.image_url = AssetLifecycle::normalize_reference(request.image_url.as_deref());
        request.validate(self.max_tags)?;

        let uploaded = self.assets.store_cover(cover)?;
        if let Some(path) = &uploaded {
            request.image_url = Some(path.clone());
        }
        Ok((request, uploaded))
    }

    /// Save `item`, deleting a freshly uploaded cover if the save fails.
    fn save_or_release(
        &self,
        item: CatalogItem,
        uploaded: Option<&str>,
    ) -> Result<CatalogItem, CatalogError> {
        self.store.save(item).inspect_err(|_| {
            self.assets.release(uploaded);
        })
    }
}
