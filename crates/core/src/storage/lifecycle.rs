//! When covers are stored and when they are released.
//!
//! An item owns at most one stored cover. A replaced or orphaned cover is
//! deleted only after the write that dropped it has been saved, and a
//! failed deletion never fails that write.

use std::sync::Arc;

use tracing::{info, warn};

use super::{AssetStorage, CoverUpload};
use crate::catalog::normalize::clean;
use crate::catalog::CatalogError;
use crate::metrics;

/// Default upload cap: 5 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Decides when covers are written to and removed from storage.
#[derive(Clone)]
pub struct AssetLifecycle {
    storage: Arc<dyn AssetStorage>,
    max_upload_bytes: usize,
}

impl AssetLifecycle {
    pub fn new(storage: Arc<dyn AssetStorage>) -> Self {
        Self {
            storage,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Blank references mean "no cover".
    pub fn normalize_reference(image_url: Option<&str>) -> Option<String> {
        clean(image_url)
    }

    /// Store an uploaded cover and return its public path.
    ///
    /// A missing or empty upload stores nothing and returns `None`. Uploads
    /// over the size cap fail with a validation error before touching
    /// storage.
    pub fn store_cover(&self, cover: Option<&CoverUpload>) -> Result<Option<String>, CatalogError> {
        let Some(cover) = cover.filter(|c| !c.is_empty()) else {
            return Ok(None);
        };

        if cover.bytes.len() > self.max_upload_bytes {
            return Err(CatalogError::Validation(format!(
                "cover exceeds {} bytes",
                self.max_upload_bytes
            )));
        }

        match self.storage.store(&cover.bytes, &cover.file_name) {
            Ok(path) => {
                metrics::COVER_STORES.with_label_values(&["success"]).inc();
                info!(path = %path, size = cover.bytes.len(), "Cover stored");
                Ok(Some(path))
            }
            Err(e) => {
                metrics::COVER_STORES.with_label_values(&["failure"]).inc();
                Err(CatalogError::Storage(e.to_string()))
            }
        }
    }

    /// Delete `previous` if a saved write replaced it with something else.
    ///
    /// Returns true when a deletion was attempted.
    pub fn release_replaced(&self, previous: Option<&str>, current: Option<&str>) -> bool {
        let previous = Self::normalize_reference(previous);
        let current = Self::normalize_reference(current);

        match previous {
            Some(previous) if Some(&previous) != current.as_ref() => {
                self.discard(&previous);
                true
            }
            _ => false,
        }
    }

    /// Delete a cover that no longer belongs to any item.
    ///
    /// Returns true when a deletion was attempted.
    pub fn release(&self, image_url: Option<&str>) -> bool {
        match Self::normalize_reference(image_url) {
            Some(path) => {
                self.discard(&path);
                true
            }
            None => false,
        }
    }

    fn discard(&self, path: &str) {
        if let Err(e) = self.storage.delete(path) {
            metrics::COVER_DELETE_FAILURES.inc();
            warn!(path, error = %e, "Failed to delete cover, leaving it behind");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAssetStorage;

    fn lifecycle() -> (Arc<MockAssetStorage>, AssetLifecycle) {
        let storage = Arc::new(MockAssetStorage::new());
        let lifecycle = AssetLifecycle::new(storage.clone());
        (storage, lifecycle)
    }

    #[test]
    fn test_store_cover_returns_path() {
        let (storage, lifecycle) = lifecycle();
        let cover = CoverUpload::new("cover.png", b"png".to_vec());

        let path = lifecycle.store_cover(Some(&cover)).unwrap().unwrap();

        assert!(path.starts_with("/files/"));
        assert!(path.ends_with(".png"));
        assert_eq!(storage.recorded_stores().len(), 1);
    }

    #[test]
    fn test_store_cover_without_upload() {
        let (storage, lifecycle) = lifecycle();
        assert_eq!(lifecycle.store_cover(None).unwrap(), None);

        let empty = CoverUpload::new("cover.png", Vec::new());
        assert_eq!(lifecycle.store_cover(Some(&empty)).unwrap(), None);
        assert!(storage.recorded_stores().is_empty());
    }

    #[test]
    fn test_store_cover_rejects_oversized_upload() {
        let (storage, lifecycle) = lifecycle();
        let lifecycle = lifecycle.with_max_upload_bytes(4);
        let cover = CoverUpload::new("cover.png", b"12345".to_vec());

        let result = lifecycle.store_cover(Some(&cover));
        assert!(matches!(result, Err(CatalogError::Validation(_))));
        assert!(storage.recorded_stores().is_empty());
    }

    #[test]
    fn test_store_failure_is_an_error() {
        let (storage, lifecycle) = lifecycle();
        storage.set_fail_stores(true);
        let cover = CoverUpload::new("cover.png", b"png".to_vec());

        let result = lifecycle.store_cover(Some(&cover));
        assert!(matches!(result, Err(CatalogError::Storage(_))));
    }

    #[test]
    fn test_release_replaced_deletes_previous() {
        let (storage, lifecycle) = lifecycle();
        assert!(lifecycle.release_replaced(Some("/files/a.png"), Some("/files/b.png")));
        assert!(lifecycle.release_replaced(Some("/files/c.png"), None));
        assert_eq!(
            storage.recorded_deletes(),
            vec!["/files/a.png".to_string(), "/files/c.png".to_string()]
        );
    }

    #[test]
    fn test_release_replaced_keeps_unchanged_cover() {
        let (storage, lifecycle) = lifecycle();
        assert!(!lifecycle.release_replaced(Some("/files/a.png"), Some("/files/a.png")));
        assert!(!lifecycle.release_replaced(None, Some("/files/a.png")));
        assert!(!lifecycle.release_replaced(Some("  "), None));
        assert!(storage.recorded_deletes().is_empty());
    }

    #[test]
    fn test_release_replaced_trims_before_comparing() {
        let (storage, lifecycle) = lifecycle();
        assert!(!lifecycle.release_replaced(Some(" /files/a.png "), Some("/files/a.png")));
        assert!(storage.recorded_deletes().is_empty());
    }

    #[test]
    fn test_release_swallows_delete_failure() {
        let (storage, lifecycle) = lifecycle();
        storage.set_fail_deletes(true);
        assert!(lifecycle.release(Some("/files/a.png")));
        assert_eq!(storage.recorded_deletes(), vec!["/files/a.png".to_string()]);
    }

    #[test]
    fn test_release_blank_is_noop() {
        let (storage, lifecycle) = lifecycle();
        assert!(!lifecycle.release(None));
        assert!(!lifecycle.release(Some("")));
        assert!(storage.recorded_deletes().is_empty());
    }
}
