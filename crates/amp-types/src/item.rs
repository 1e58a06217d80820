use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Whether an item is a container or a versionable file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Folder,
    File,
}

impl ItemKind {
    /// The value stored in the `kind` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::File => "file",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(Self::Folder),
            "file" => Ok(Self::File),
            other => Err(TypeError::UnknownItemKind(other.to_string())),
        }
    }
}

/// Best-effort content classification, by file extension only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MimeType {
    #[serde(rename = "text/markdown")]
    Markdown,
    #[serde(rename = "text/csv")]
    Csv,
    #[serde(rename = "text/plain")]
    PlainText,
}

impl MimeType {
    /// `.md` → markdown, `.csv` → csv, anything else → plain text.
    pub fn detect(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("md") => Self::Markdown,
            Some("csv") => Self::Csv,
            _ => Self::PlainText,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "text/markdown",
            Self::Csv => "text/csv",
            Self::PlainText => "text/plain",
        }
    }

    /// Parse a stored MIME string. Unknown or missing values read as plain text.
    pub fn from_stored(s: Option<&str>) -> Self {
        match s {
            Some("text/markdown") => Self::Markdown,
            Some("text/csv") => Self::Csv,
            _ => Self::PlainText,
        }
    }

    /// Default file extension for exports, including the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => ".md",
            Self::Csv => ".csv",
            Self::PlainText => ".txt",
        }
    }

    /// Short export-format tag (`md`, `csv`, `txt`).
    pub fn format_tag(&self) -> &'static str {
        &self.extension()[1..]
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
