use std::path::PathBuf;

use crate::key::BlobKey;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested blob was not found.
    #[error("blob not found: {0}")]
    NotFound(BlobKey),

    /// A stored relative path does not have the `artifacts/<item>/vNNNN.bin` shape.
    #[error("invalid blob path: {0}")]
    InvalidPath(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to move a fully written temp file into place.
    #[error("failed to persist blob at {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
