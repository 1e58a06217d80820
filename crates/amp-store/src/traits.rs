use std::io::{Cursor, Read};

use crate::error::StoreResult;
use crate::key::BlobKey;

/// Storage for version bytes.
///
/// All implementations must satisfy these invariants:
/// - `put` is all-or-nothing. After it returns `Ok`, `get` yields exactly the
///   bytes written; after it returns `Err`, no partial file is visible at the
///   key's path.
/// - `put` on an existing key replaces it. Committed versions are never
///   rewritten by the engine; only orphans left by aborted writes are.
/// - Concurrent reads are always safe.
/// - All I/O errors are propagated, never silently ignored.
pub trait BlobStore: Send + Sync {
    /// Write the bytes for `key` and return the relative path recorded in metadata.
    fn put(&self, key: &BlobKey, data: &[u8]) -> StoreResult<String>;

    /// Read the bytes for `key`.
    ///
    /// Returns `Ok(None)` if no blob exists.
    fn get(&self, key: &BlobKey) -> StoreResult<Option<Vec<u8>>>;

    /// Check whether a blob exists.
    fn exists(&self, key: &BlobKey) -> StoreResult<bool>;

    /// Delete a blob. Returns `true` if it existed.
    ///
    /// Intended for garbage collection of orphans only.
    fn delete(&self, key: &BlobKey) -> StoreResult<bool>;

    /// Every key currently present, sorted.
    fn list(&self) -> StoreResult<Vec<BlobKey>>;

    /// Size in bytes of a stored blob, if present.
    ///
    /// Default implementation reads the blob. Backends may override.
    fn size(&self, key: &BlobKey) -> StoreResult<Option<u64>> {
        Ok(self.get(key)?.map(|b| b.len() as u64))
    }

    /// Stream the bytes for `key`. Returns `Ok(None)` if no blob exists.
    ///
    /// Default implementation buffers the blob through [`BlobStore::get`].
    fn reader(&self, key: &BlobKey) -> StoreResult<Option<Box<dyn Read + Send>>> {
        Ok(self
            .get(key)?
            .map(|data| Box::new(Cursor::new(data)) as Box<dyn Read + Send>))
    }

    /// Relative paths of partial files left behind by interrupted writes.
    fn stale_temp_files(&self) -> StoreResult<Vec<String>> {
        Ok(Vec::new())
    }

    /// Delete every partial file left by an interrupted write.
    ///
    /// Returns each removed relative path with its size in bytes.
    fn purge_temp_files(&self) -> StoreResult<Vec<(String, u64)>> {
        Ok(Vec::new())
    }
}
