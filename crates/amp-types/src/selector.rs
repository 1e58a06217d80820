use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Which version of an artifact an operation refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSelector {
    /// The row with the highest version number for the artifact's item.
    Latest,
    /// An explicit version number (1-based).
    Number(u32),
}

impl VersionSelector {
    /// `Number(n)`; `None` for zero, which is never a valid version.
    pub fn number(n: u32) -> Option<Self> {
        (n > 0).then_some(Self::Number(n))
    }

    pub fn is_latest(&self) -> bool {
        matches!(self, Self::Latest)
    }
}

impl Default for VersionSelector {
    fn default() -> Self {
        Self::Latest
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Number(n) => write!(f, "v{n}"),
        }
    }
}

/// Accepts `latest`, `7`, `v7` and zero-padded forms such as `v0007`.
impl FromStr for VersionSelector {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        let digits = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .ok()
            .and_then(Self::number)
            .ok_or_else(|| TypeError::InvalidVersionSelector(s.to_string()))
    }
}
