use std::fmt;
use std::path::{Path, PathBuf};

use amp_types::ItemId;

use crate::error::{StoreError, StoreResult};

/// Top-level directory (under the data root) that holds all blobs.
pub const ARTIFACTS_DIR: &str = "artifacts";

/// Address of one version's bytes: the owning item plus the version number.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobKey {
    pub item_id: ItemId,
    pub version: u32,
}

impl BlobKey {
    pub fn new(item_id: ItemId, version: u32) -> Self {
        Self { item_id, version }
    }

    /// File name inside the item directory, e.g. `v0003.bin`.
    pub fn file_name(&self) -> String {
        format!("v{:04}.bin", self.version)
    }

    /// Forward-slash relative path recorded in the version row,
    /// e.g. `artifacts/itm_0a1b2c3d/v0003.bin`.
    pub fn rel_path(&self) -> String {
        format!("{ARTIFACTS_DIR}/{}/{}", self.item_id, self.file_name())
    }

    /// Absolute location under `root`.
    pub fn path_under(&self, root: &Path) -> PathBuf {
        root.join(ARTIFACTS_DIR)
            .join(self.item_id.as_str())
            .join(self.file_name())
    }

    /// Parse a relative path back into a key.
    ///
    /// Only the exact shape produced by [`BlobKey::rel_path`] is accepted, so
    /// a path read from the database can never escape the artifacts directory.
    pub fn from_rel_path(rel: &str) -> StoreResult<Self> {
        let invalid = || StoreError::InvalidPath(rel.to_string());

        let mut parts = rel.split('/');
        let (Some(dir), Some(item), Some(file), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        if dir != ARTIFACTS_DIR || !is_safe_component(item) {
            return Err(invalid());
        }
        let item_id = ItemId::parse(item).map_err(|_| invalid())?;

        let digits = file
            .strip_prefix('v')
            .and_then(|f| f.strip_suffix(".bin"))
            .ok_or_else(invalid)?;
        if digits.len() < 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let version: u32 = digits.parse().map_err(|_| invalid())?;
        if version == 0 {
            return Err(invalid());
        }

        let key = Self { item_id, version };
        // Reject non-canonical padding such as v00003.bin.
        if key.file_name() != file {
            return Err(invalid());
        }
        Ok(key)
    }
}

fn is_safe_component(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({})", self.rel_path())
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rel_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(v: u32) -> BlobKey {
        BlobKey::new(ItemId::from_raw("itm_0a1b2c3d"), v)
    }

    #[test]
    fn rel_path_is_zero_padded() {
        assert_eq!(key(1).rel_path(), "artifacts/itm_0a1b2c3d/v0001.bin");
        assert_eq!(key(42).file_name(), "v0042.bin");
        assert_eq!(key(12345).file_name(), "v12345.bin");
    }

    #[test]
    fn parse_roundtrip() {
        for v in [1, 9, 10, 9999, 10000] {
            let k = key(v);
            assert_eq!(BlobKey::from_rel_path(&k.rel_path()).unwrap(), k);
        }
    }

    #[test]
    fn parse_rejects_traversal_and_garbage() {
        for bad in [
            "",
            "artifacts/itm_0a1b2c3d",
            "artifacts/../v0001.bin",
            "artifacts/itm_x/../../etc/passwd",
            "blobs/itm_0a1b2c3d/v0001.bin",
            "artifacts/itm_0a1b2c3d/v1.bin",
            "artifacts/itm_0a1b2c3d/v0000.bin",
            "artifacts/itm_0a1b2c3d/v00001.bin",
            "artifacts/itm_0a1b2c3d/v0001.tmp",
            "artifacts/art_0a1b2c3d/v0001.bin",
        ] {
            assert!(BlobKey::from_rel_path(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn path_under_root() {
        let p = key(3).path_under(Path::new("/data"));
        assert_eq!(p, PathBuf::from("/data/artifacts/itm_0a1b2c3d/v0003.bin"));
    }
}
