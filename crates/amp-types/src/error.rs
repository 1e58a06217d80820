use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier {id:?}: expected prefix {expected:?}")]
    InvalidIdPrefix { id: String, expected: &'static str },

    #[error("invalid version selector: {0:?} (expected \"latest\" or a positive number)")]
    InvalidVersionSelector(String),

    #[error("unknown item kind: {0}")]
    UnknownItemKind(String),
}
