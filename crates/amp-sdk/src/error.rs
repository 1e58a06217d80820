use amp_crypto::Digest;
use amp_meta::MetaError;
use amp_types::ArtifactId;
use thiserror::Error;

/// Errors surfaced by the [`Amp`](crate::Amp) engine.
#[derive(Debug, Error)]
pub enum AmpError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Stored bytes no longer hash to the digest recorded for their version.
    #[error("integrity check failed for {artifact} v{version}: expected {expected}, got {actual}")]
    Integrity {
        artifact: ArtifactId,
        version: u32,
        expected: Digest,
        actual: Digest,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(String),

    #[error("store error: {0}")]
    Store(#[from] amp_store::StoreError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AmpError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<MetaError> for AmpError {
    fn from(e: MetaError) -> Self {
        match e {
            MetaError::NotFound { entity, id } => Self::NotFound { entity, id },
            MetaError::ConstraintViolation(msg) => Self::ConstraintViolation(msg),
            MetaError::InvalidArgument(msg) => Self::InvalidArgument(msg),
            MetaError::Corrupt(msg) => Self::Database(msg),
            MetaError::Database(e) => Self::Database(e.to_string()),
            MetaError::Io(e) => Self::Io(e),
        }
    }
}

pub type AmpResult<T> = Result<T, AmpError>;
