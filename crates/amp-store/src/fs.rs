use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::key::{BlobKey, ARTIFACTS_DIR};
use crate::traits::BlobStore;

/// File name prefix of in-progress writes.
const TEMP_PREFIX: &str = ".tmp-";

/// Filesystem blob store rooted at the data directory.
///
/// Blobs live at `<root>/artifacts/<itemId>/v<NNNN>.bin`. Writes go to a
/// temp file in the target directory, are optionally `fsync`ed, and are then
/// renamed over the final path, so a crash never leaves a truncated blob at a
/// path a version row could reference.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
    sync: bool,
}

impl FsBlobStore {
    /// Open a store under `root`, creating `root/artifacts` if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(ARTIFACTS_DIR))?;
        Ok(Self { root, sync: true })
    }

    /// Skip `fsync` before rename. Faster; only safe when durability across
    /// power loss does not matter (tests, scratch directories).
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// The data directory this store is rooted at.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a blob.
    pub fn path_of(&self, key: &BlobKey) -> PathBuf {
        key.path_under(&self.root)
    }

    /// Every regular file inside an item directory, as `(absolute, relative)`.
    fn item_files(&self) -> StoreResult<Vec<(PathBuf, String)>> {
        let base = self.root.join(ARTIFACTS_DIR);
        let mut files = Vec::new();
        for entry in WalkDir::new(&base).min_depth(2).max_depth(2) {
            let entry = entry.map_err(|e| {
                StoreError::Io(e.into_io_error().unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::Other, "filesystem loop under artifacts")
                }))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push((entry.path().to_path_buf(), rel));
        }
        Ok(files)
    }

    fn temp_files(&self) -> StoreResult<Vec<(PathBuf, String)>> {
        Ok(self
            .item_files()?
            .into_iter()
            .filter(|(path, _)| is_temp_file(path))
            .collect())
    }
}

fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with(TEMP_PREFIX))
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &BlobKey, data: &[u8]) -> StoreResult<String> {
        let path = self.path_of(key);
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::InvalidPath(key.rel_path()))?;
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(dir)?;
        tmp.write_all(data)?;
        tmp.flush()?;
        if self.sync {
            tmp.as_file().sync_all()?;
        }
        tmp.persist(&path).map_err(|e| StoreError::Persist {
            path: path.clone(),
            source: e.error,
        })?;

        debug!(key = %key, bytes = data.len(), "blob written");
        Ok(key.rel_path())
    }

    fn get(&self, key: &BlobKey) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.path_of(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, key: &BlobKey) -> StoreResult<bool> {
        Ok(self.path_of(key).try_exists()?)
    }

    fn delete(&self, key: &BlobKey) -> StoreResult<bool> {
        let path = self.path_of(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                // Drop the item directory once its last blob is gone.
                if let Some(dir) = path.parent() {
                    let _ = fs::remove_dir(dir);
                }
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> StoreResult<Vec<BlobKey>> {
        let mut keys = Vec::new();
        for (path, rel) in self.item_files()? {
            if is_temp_file(&path) {
                continue;
            }
            match BlobKey::from_rel_path(&rel) {
                Ok(key) => keys.push(key),
                Err(_) => warn!(path = %rel, "ignoring unrecognized file in blob store"),
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn size(&self, key: &BlobKey) -> StoreResult<Option<u64>> {
        match fs::metadata(self.path_of(key)) {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn reader(&self, key: &BlobKey) -> StoreResult<Option<Box<dyn Read + Send>>> {
        match File::open(self.path_of(key)) {
            Ok(file) => Ok(Some(Box::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn stale_temp_files(&self) -> StoreResult<Vec<String>> {
        let mut rels: Vec<String> = self.temp_files()?.into_iter().map(|(_, rel)| rel).collect();
        rels.sort();
        Ok(rels)
    }

    fn purge_temp_files(&self) -> StoreResult<Vec<(String, u64)>> {
        let mut removed = Vec::new();
        for (path, rel) in self.temp_files()? {
            let size = match fs::metadata(&path) {
                Ok(meta) => meta.len(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
            if let Some(dir) = path.parent() {
                let _ = fs::remove_dir(dir);
            }
            debug!(path = %rel, bytes = size, "stale temp file removed");
            removed.push((rel, size));
        }
        removed.sort();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amp_types::ItemId;

    fn key(item: &str, v: u32) -> BlobKey {
        BlobKey::new(ItemId::from_raw(item), v)
    }

    #[test]
    fn put_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        let k = key("itm_00000001", 1);

        let rel = store.put(&k, b"hello").unwrap();
        assert_eq!(rel, "artifacts/itm_00000001/v0001.bin");
        assert!(dir.path().join(&rel).is_file());
        assert_eq!(store.get(&k).unwrap().unwrap(), b"hello");
        assert_eq!(store.size(&k).unwrap(), Some(5));
    }

    #[test]
    fn get_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        let k = key("itm_00000002", 1);
        assert!(store.get(&k).unwrap().is_none());
        assert!(!store.exists(&k).unwrap());
        assert_eq!(store.size(&k).unwrap(), None);
    }

    #[test]
    fn put_replaces_orphan() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap().with_sync(false);
        let k = key("itm_00000003", 2);
        store.put(&k, b"stale").unwrap();
        store.put(&k, b"fresh").unwrap();
        assert_eq!(store.get(&k).unwrap().unwrap(), b"fresh");
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        let k = key("itm_00000004", 1);
        store.put(&k, b"data").unwrap();
        let names: Vec<_> = fs::read_dir(dir.path().join("artifacts/itm_00000004"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["v0001.bin".to_string()]);
    }

    #[test]
    fn delete_removes_file_and_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        let k = key("itm_00000005", 1);
        store.put(&k, b"x").unwrap();
        assert!(store.delete(&k).unwrap());
        assert!(!store.exists(&k).unwrap());
        assert!(!dir.path().join("artifacts/itm_00000005").exists());
        assert!(!store.delete(&k).unwrap());
    }

    #[test]
    fn list_returns_sorted_keys_and_skips_strays() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        store.put(&key("itm_bbbbbbbb", 1), b"b1").unwrap();
        store.put(&key("itm_aaaaaaaa", 2), b"a2").unwrap();
        store.put(&key("itm_aaaaaaaa", 1), b"a1").unwrap();
        fs::write(dir.path().join("artifacts/itm_aaaaaaaa/notes.txt"), b"stray").unwrap();

        let keys = store.list().unwrap();
        assert_eq!(
            keys,
            vec![
                key("itm_aaaaaaaa", 1),
                key("itm_aaaaaaaa", 2),
                key("itm_bbbbbbbb", 1),
            ]
        );
    }

    #[test]
    fn interrupted_writes_are_reported_and_purged() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        store.put(&key("itm_cccccccc", 1), b"kept").unwrap();
        fs::write(dir.path().join("artifacts/itm_cccccccc/.tmp-a1b2c3"), b"partial").unwrap();
        fs::create_dir_all(dir.path().join("artifacts/itm_dddddddd")).unwrap();
        fs::write(dir.path().join("artifacts/itm_dddddddd/.tmp-zz"), b"xy").unwrap();

        assert_eq!(store.list().unwrap(), vec![key("itm_cccccccc", 1)]);
        assert_eq!(
            store.stale_temp_files().unwrap(),
            vec![
                "artifacts/itm_cccccccc/.tmp-a1b2c3".to_string(),
                "artifacts/itm_dddddddd/.tmp-zz".to_string(),
            ]
        );

        let removed = store.purge_temp_files().unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].1, 7);
        assert!(store.stale_temp_files().unwrap().is_empty());
        assert!(!dir.path().join("artifacts/itm_dddddddd").exists());
        assert_eq!(store.get(&key("itm_cccccccc", 1)).unwrap().unwrap(), b"kept");
    }

    #[test]
    fn reader_streams_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        let k = key("itm_eeeeeeee", 1);
        store.put(&k, b"streamed").unwrap();

        let mut buf = Vec::new();
        store.reader(&k).unwrap().unwrap().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"streamed");
        assert!(store.reader(&key("itm_eeeeeeee", 2)).unwrap().is_none());
    }

    #[test]
    fn list_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).unwrap();
        assert!(store.list().unwrap().is_empty());
    }
}
