//! Blob storage for Amp.
//!
//! Each committed artifact version owns exactly one immutable file holding its
//! raw bytes. Files are addressed by a deterministic path derived from the
//! owning item and the version number:
//!
//! ```text
//! artifacts/<itemId>/v<NNNN>.bin
//! ```
//!
//! relative to the data directory that also holds the metadata database.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`FsBlobStore`] -- files under a data directory (production)
//! - [`InMemoryBlobStore`] -- `BTreeMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. A blob is written completely before the version row that references it
//!    is committed. Readers never observe a row without its bytes.
//! 2. Writes are all-or-nothing: temp file, fsync, rename.
//! 3. A blob whose transaction aborted stays on disk as an orphan until a
//!    reconciliation pass removes it.
//! 4. The store never interprets blob contents.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod key;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use key::{BlobKey, ARTIFACTS_DIR};
pub use memory::InMemoryBlobStore;
pub use traits::BlobStore;
