//! High-level SDK for Amp.
//!
//! [`Amp`] is the main entry point for applications embedding Amp. It stores
//! user files as immutable, content-hashed, densely numbered versions grouped
//! into projects, with metadata in SQLite and bytes in a [`BlobStore`].

pub mod config;
pub mod error;
pub mod options;
pub mod report;
pub mod repository;
pub mod viewer;

pub use config::{AmpConfig, CONFIG_FILE};
pub use error::{AmpError, AmpResult};
pub use options::{AddArtifact, AddedArtifact, AppendVersion};
pub use report::{GcReport, VerifyIssue, VerifyReport};
pub use repository::Amp;
pub use viewer::{viewer_for, ContentViewer, CsvViewer, TextViewer};

// Re-export key types
pub use amp_crypto::Digest;
pub use amp_meta::{Artifact, Item, Project, VersionRow};
pub use amp_store::{BlobKey, BlobStore, FsBlobStore, InMemoryBlobStore};
pub use amp_types::{
    ArtifactId, IdGenerator, ItemId, ItemKind, MimeType, ProjectId, RunId, VersionId,
    VersionSelector,
};
