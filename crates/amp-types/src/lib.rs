//! Foundation types for Amp.
//!
//! Every other Amp crate depends on `amp-types`. It holds the pieces of the
//! data model that carry no I/O: identifiers, slugs, version selectors and
//! item classification.
//!
//! # Key Types
//!
//! - [`IdGenerator`] -- Injected source of short, prefixed, random identifiers
//! - [`ProjectId`], [`ItemId`], [`ArtifactId`], [`VersionId`], [`RunId`] -- Typed identifiers
//! - [`slugify`] -- Display name to path-safe token
//! - [`VersionSelector`] -- `latest` or an explicit version number
//! - [`ItemKind`] / [`MimeType`] -- Item classification

pub mod error;
pub mod ids;
pub mod item;
pub mod selector;
pub mod slug;

pub use error::TypeError;
pub use ids::{ArtifactId, IdGenerator, ItemId, ProjectId, RunId, VersionId};
pub use item::{ItemKind, MimeType};
pub use selector::VersionSelector;
pub use slug::slugify;
