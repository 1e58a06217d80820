use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AmpError, AmpResult};

/// Name of the optional configuration file inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Engine configuration. Every field has a default, so a partial
/// `config.toml` only overrides what it names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmpConfig {
    /// SQLite file name, relative to the data directory.
    pub db_file: String,
    /// Creator recorded when a caller does not name one.
    pub default_creator: String,
    /// Re-hash bytes on read and export.
    pub verify_on_export: bool,
    /// Directory for exports without an explicit destination.
    pub export_dir: PathBuf,
    /// `fsync` blob files before they are renamed into place.
    pub sync_blobs: bool,
}

impl Default for AmpConfig {
    fn default() -> Self {
        Self {
            db_file: "amp.db".into(),
            default_creator: "user_local".into(),
            verify_on_export: true,
            export_dir: PathBuf::from("."),
            sync_blobs: true,
        }
    }
}

impl AmpConfig {
    /// Load `<data_dir>/config.toml`, falling back to defaults when absent.
    pub fn load(data_dir: &Path) -> AmpResult<Self> {
        let path = data_dir.join(CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => Self::from_toml_str(&content)
                .map_err(|e| AmpError::Config(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_toml_str(s: &str) -> AmpResult<Self> {
        toml::from_str(s).map_err(|e| AmpError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = AmpConfig::default();
        assert_eq!(c.db_file, "amp.db");
        assert_eq!(c.default_creator, "user_local");
        assert!(c.verify_on_export);
        assert!(c.sync_blobs);
        assert_eq!(c.export_dir, PathBuf::from("."));
    }

    #[test]
    fn partial_file_overrides_named_fields() {
        let c = AmpConfig::from_toml_str("default_creator = \"ci\"\nsync_blobs = false\n").unwrap();
        assert_eq!(c.default_creator, "ci");
        assert!(!c.sync_blobs);
        assert_eq!(c.db_file, "amp.db");
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(AmpConfig::load(dir.path()).unwrap(), AmpConfig::default());
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "verify_on_export = \"maybe\"").unwrap();
        assert!(matches!(AmpConfig::load(dir.path()), Err(AmpError::Config(_))));
    }
}
