use amp_types::{ArtifactId, ItemId, RunId, VersionSelector};
use serde::{Deserialize, Serialize};

/// Options for adding a new artifact.
#[derive(Clone, Debug, Default)]
pub struct AddArtifact {
    /// Display name. Defaults to the file's base name.
    pub name: Option<String>,
    pub comment: Option<String>,
    /// Defaults to the configured creator.
    pub created_by: Option<String>,
    /// Folder item to place the new item under.
    pub parent: Option<ItemId>,
    pub source_run_id: Option<RunId>,
    pub exported_as: Option<String>,
}

/// Options for appending a version to an existing artifact.
#[derive(Clone, Debug, Default)]
pub struct AppendVersion {
    pub comment: Option<String>,
    pub created_by: Option<String>,
    pub source_run_id: Option<RunId>,
    pub exported_as: Option<String>,
    /// Version of the same artifact this one was derived from.
    pub merge_base: Option<VersionSelector>,
}

/// Identifiers of a freshly written version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedArtifact {
    pub artifact_id: ArtifactId,
    pub item_id: ItemId,
    pub version: u32,
}
