use std::io;

/// Errors produced while writing or reading run logs.
#[derive(Debug, thiserror::Error)]
pub enum RunLogError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The logger was closed and can no longer accept events.
    #[error("run log is closed")]
    Closed,
}

/// Convenience alias used throughout the run log crate.
pub type Result<T> = std::result::Result<T, RunLogError>;
