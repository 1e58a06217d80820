use thiserror::Error;

/// Errors from metadata store operations.
#[derive(Debug, Error)]
pub enum MetaError {
    /// A referenced project, item, artifact or version does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness or immutability constraint rejected the write.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// The request is well-formed but not valid for the current state.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The database holds something this build cannot interpret.
    #[error("corrupt database: {0}")]
    Corrupt(String),

    /// Underlying SQLite failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Creating the database directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MetaError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Returns `true` when SQLite rejected a statement because of a constraint.
pub(crate) fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Convenience alias used throughout the metadata crate.
pub type MetaResult<T> = std::result::Result<T, MetaError>;
