use amp_types::ItemId;
use serde::Serialize;

/// Outcome of a garbage collection pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GcReport {
    /// Relative paths of the blobs that were removed.
    pub removed: Vec<String>,
    pub bytes_freed: u64,
}

/// A committed version whose bytes are not what the metadata promises.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum VerifyIssue {
    Missing {
        item_id: ItemId,
        version: u32,
        rel_path: String,
    },
    Corrupt {
        item_id: ItemId,
        version: u32,
        rel_path: String,
        expected: String,
        actual: String,
    },
    /// The recorded path does not name a blob inside the artifacts directory.
    InvalidPath {
        item_id: ItemId,
        version: u32,
        rel_path: String,
    },
}

/// Outcome of a full integrity check.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub checked: usize,
    pub issues: Vec<VerifyIssue>,
    /// Blobs with no version row, plus partial files from interrupted writes.
    pub orphans: Vec<String>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}
