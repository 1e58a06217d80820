use std::fmt;
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Number of random bytes in an identifier suffix (8 hex characters).
pub const ID_SUFFIX_BYTES: usize = 4;

/// Source of short, prefixed, collision-resistant identifiers.
///
/// Identifiers look like `proj_ab12cd34`: a fixed prefix, an underscore and
/// [`ID_SUFFIX_BYTES`] random bytes in lowercase hex. The generator is an
/// explicit value rather than a hidden global. Production code creates one
/// with [`IdGenerator::from_entropy`] and shares it behind an `Arc`; tests use
/// [`IdGenerator::seeded`] to get a reproducible sequence.
pub struct IdGenerator {
    rng: Mutex<StdRng>,
}

impl IdGenerator {
    /// Generator backed by a cryptographically strong RNG seeded from the OS.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic generator for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// `"<prefix>_<8 hex>"`.
    pub fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}_{}", self.suffix(ID_SUFFIX_BYTES))
    }

    /// `n` random bytes, hex-encoded (`2 * n` characters).
    pub fn suffix(&self, n: usize) -> String {
        let mut bytes = vec![0u8; n];
        self.rng
            .lock()
            .expect("id generator lock poisoned")
            .fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    pub fn project_id(&self) -> ProjectId {
        ProjectId(self.next_id(ProjectId::PREFIX))
    }

    pub fn item_id(&self) -> ItemId {
        ItemId(self.next_id(ItemId::PREFIX))
    }

    pub fn artifact_id(&self) -> ArtifactId {
        ArtifactId(self.next_id(ArtifactId::PREFIX))
    }

    pub fn version_id(&self) -> VersionId {
        VersionId(self.next_id(VersionId::PREFIX))
    }

    pub fn run_id(&self) -> RunId {
        RunId(self.next_id(RunId::PREFIX))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator").finish_non_exhaustive()
    }
}

macro_rules! prefixed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix carried by every identifier of this type.
            pub const PREFIX: &'static str = $prefix;

            /// Parse and validate an identifier string.
            pub fn parse(s: &str) -> Result<Self, TypeError> {
                let valid = s
                    .strip_prefix($prefix)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .is_some_and(|rest| !rest.is_empty());
                if !valid {
                    return Err(TypeError::InvalidIdPrefix {
                        id: s.to_string(),
                        expected: $prefix,
                    });
                }
                Ok(Self(s.to_string()))
            }

            /// Wrap a value read back from storage without validation.
            pub fn from_raw(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

prefixed_id!(
    /// Identifier of a project (`proj_…`).
    ProjectId, "proj"
);
prefixed_id!(
    /// Identifier of a folder or file item (`itm_…`).
    ItemId, "itm"
);
prefixed_id!(
    /// Identifier of an artifact (`art_…`).
    ArtifactId, "art"
);
prefixed_id!(
    /// Identifier of a single artifact version row (`arv_…`).
    VersionId, "arv"
);
prefixed_id!(
    /// Identifier of an agent run (`run_…`).
    RunId, "run"
);
