//! Filesystem-backed cover storage.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use super::{AssetStorage, StorageError};
use crate::config::StorageConfig;

/// Longest extension kept from an uploaded file name.
const MAX_EXTENSION_LEN: usize = 10;

/// Stores covers as flat files under a root directory.
///
/// Files are named `<uuid>.<ext>` and published as `<public_prefix><name>`.
pub struct FsAssetStorage {
    root: PathBuf,
    public_prefix: String,
}

impl FsAssetStorage {
    /// Create a storage rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>, public_prefix: &str) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StorageError::RootCreationFailed {
            path: root.clone(),
            source: e,
        })?;

        Ok(Self {
            root,
            public_prefix: normalize_prefix(public_prefix),
        })
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        Self::new(&config.root, &config.public_prefix)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    /// Map a public path back to a file under the root.
    ///
    /// Returns `None` for paths outside the prefix or that would escape the
    /// root.
    fn resolve(&self, relative_path: &str) -> Option<PathBuf> {
        let name = relative_path.trim().strip_prefix(&self.public_prefix)?;
        let is_plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        is_plain.then(|| self.root.join(name))
    }
}

impl AssetStorage for FsAssetStorage {
    fn store(&self, bytes: &[u8], original_name: &str) -> Result<String, StorageError> {
        let file_name = match extension_of(original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let path = self.root.join(&file_name);

        fs::write(&path, bytes).map_err(|e| StorageError::WriteFailed {
            path: path.clone(),
            source: e,
        })?;
        debug!(path = %path.display(), size = bytes.len(), "Stored cover");

        Ok(format!("{}{}", self.public_prefix, file_name))
    }

    fn delete(&self, relative_path: &str) -> Result<(), StorageError> {
        let Some(path) = self.resolve(relative_path) else {
            debug!(relative_path, "Ignoring delete for unmanaged path");
            return Ok(());
        };

        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Deleted cover");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed { path, source: e }),
        }
    }
}

/// Ensure the prefix starts and ends with `/`.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

/// Extension of the client-supplied name, if it is short and alphanumeric.
fn extension_of(original_name: &str) -> Option<&str> {
    let base = original_name.rsplit(['/', '\\']).next().unwrap_or(original_name);
    let (stem, ext) = base.rsplit_once('.')?;
    let usable = !stem.is_empty()
        && !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    usable.then_some(ext)
}
