//! Transactional metadata store for Amp.
//!
//! The metadata store is the source of truth for identifiers, ordering and
//! relationships. Its SQLite schema enforces the model's invariants at the
//! storage layer rather than only in application code:
//!
//! - `(project_id, parent_id, slug)` is unique, with "no parent" treated as a
//!   single shared parent.
//! - `(item_id, version)` is unique and versions are positive.
//! - Version rows cannot be updated once committed.
//! - Items, artifacts and versions cascade when their project is deleted.
//!
//! Writers go through [`MetadataStore::write`], which runs a closure inside a
//! single `BEGIN IMMEDIATE` transaction. Reads use their own connection and
//! see the last committed state.

pub mod error;
pub mod rows;
pub mod schema;
pub mod store;

pub use error::{MetaError, MetaResult};
pub use rows::{Artifact, Item, NewFileItem, NewVersion, Project, VersionRow};
pub use store::{MetaTx, MetadataStore, MAX_SLUG_ATTEMPTS};
