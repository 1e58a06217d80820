//! Content hashing for Amp.
//!
//! Every artifact version records the SHA-256 digest of its bytes. The digest
//! is checked again when a version is exported or verified, so silent
//! corruption of the blob store is detected instead of propagated.
//!
//! Hashing is delegated to the `sha2` crate.

pub mod hasher;

pub use hasher::{ContentHasher, Digest, HasherError};
