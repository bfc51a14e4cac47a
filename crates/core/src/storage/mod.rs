//! Cover image storage.
//!
//! Covers are opaque byte blobs addressed by a public relative path such as
//! `/files/3f2c...e1.png`. The catalog stores only that path.

mod fs;
mod lifecycle;

pub use fs::FsAssetStorage;
pub use lifecycle::{AssetLifecycle, DEFAULT_MAX_UPLOAD_BYTES};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while storing or deleting a cover.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to create the storage root.
    #[error("Failed to create storage root: {path}")]
    RootCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a new file.
    #[error("Failed to write file: {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to remove an existing file.
    #[error("Failed to delete file: {path}")]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An uploaded cover image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverUpload {
    /// File name as sent by the client; only its extension is kept.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl CoverUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Trait for cover storage backends.
pub trait AssetStorage: Send + Sync {
    /// Store `bytes` under a fresh unique name, keeping the extension of
    /// `original_name`. Returns the public relative path.
    fn store(&self, bytes: &[u8], original_name: &str) -> Result<String, StorageError>;

    /// Remove the file behind a relative path.
    ///
    /// Missing files and paths this storage does not manage are not errors.
    fn delete(&self, relative_path: &str) -> Result<(), StorageError>;
}
