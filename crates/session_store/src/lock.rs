use std::fs::{File, OpenOptions};
use std::path::Path;

use fs2::FileExt;

use crate::error::SessionStoreError;
use crate::paths::lock_path;

/// Advisory lock over the session root, released on drop.
#[derive(Debug)]
pub(crate) struct StoreLock {
    file: File,
}

impl StoreLock {
    /// Exclusive lock for operations that write records or the pointer.
    pub(crate) fn exclusive(root: &Path) -> Result<Self, SessionStoreError> {
        let file = open_lock_file(root)?;
        file.lock_exclusive()
            .map_err(|source| SessionStoreError::lock(lock_path(root), source))?;
        Ok(Self { file })
    }

    /// Shared lock for read-only operations.
    ///
    /// Returns `None` when the lock file does not exist yet, so reads never
    /// create files in the session root.
    pub(crate) fn shared(root: &Path) -> Result<Option<Self>, SessionStoreError> {
        let path = lock_path(root);
        if !path.exists() {
            return Ok(None);
        }

        let file = open_lock_file(root)?;
        file.lock_shared()
            .map_err(|source| SessionStoreError::lock(&path, source))?;
        Ok(Some(Self { file }))
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(error) = self.file.unlock() {
            tracing::warn!(%error, "failed to release session lock");
        }
    }
}

fn open_lock_file(root: &Path) -> Result<File, SessionStoreError> {
    let path = lock_path(root);
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .map_err(|source| SessionStoreError::io("opening session lock file", &path, source))
}
