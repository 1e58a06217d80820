use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::key::BlobKey;
use crate::traits::BlobStore;

/// In-memory blob store.
///
/// Intended for tests and embedding. Blobs are held behind a `RwLock` for
/// safe concurrent access and cloned on read/write.
pub struct InMemoryBlobStore {
    blobs: RwLock<BTreeMap<BlobKey, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Overwrite a blob in place, bypassing the engine. Test hook for
    /// simulating on-disk corruption.
    pub fn corrupt(&self, key: &BlobKey, data: Vec<u8>) {
        self.blobs
            .write()
            .expect("lock poisoned")
            .insert(key.clone(), data);
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, key: &BlobKey, data: &[u8]) -> StoreResult<String> {
        let mut map = self.blobs.write().expect("lock poisoned");
        map.insert(key.clone(), data.to_vec());
        Ok(key.rel_path())
    }

    fn get(&self, key: &BlobKey) -> StoreResult<Option<Vec<u8>>> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn exists(&self, key: &BlobKey) -> StoreResult<bool> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }

    fn delete(&self, key: &BlobKey) -> StoreResult<bool> {
        let mut map = self.blobs.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }

    fn list(&self) -> StoreResult<Vec<BlobKey>> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.keys().cloned().collect())
    }

    fn size(&self, key: &BlobKey) -> StoreResult<Option<u64>> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.get(key).map(|b| b.len() as u64))
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .finish()
    }
}
