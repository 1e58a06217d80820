use amp_crypto::Digest;
use amp_types::{ArtifactId, ItemId, ItemKind, MimeType, ProjectId, RunId, VersionId};
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSqlError, Type};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// A named collection of items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A folder or file node inside a project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub project_id: ProjectId,
    pub parent_id: Option<ItemId>,
    pub kind: ItemKind,
    pub name: String,
    pub slug: String,
    pub sort_index: i64,
    pub is_deleted: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The versionable identity bound to one file item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub item_id: ItemId,
    pub mime_type: MimeType,
}

/// One immutable, hashed snapshot of an artifact's bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRow {
    pub id: VersionId,
    pub item_id: ItemId,
    pub version: u32,
    pub size_bytes: u64,
    pub sha256: Digest,
    pub rel_path: String,
    pub comment: Option<String>,
    pub source_run_id: Option<RunId>,
    pub exported_as: Option<String>,
    pub merge_base_version_id: Option<VersionId>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Request to create a file item together with its artifact.
#[derive(Clone, Debug)]
pub struct NewFileItem {
    pub project_id: ProjectId,
    pub parent_id: Option<ItemId>,
    pub name: String,
    pub mime_type: MimeType,
    pub created_by: String,
}

/// Fields of a version row supplied by the caller; id and timestamp are assigned on insert.
#[derive(Clone, Debug)]
pub struct NewVersion {
    pub item_id: ItemId,
    pub version: u32,
    pub size_bytes: u64,
    pub sha256: Digest,
    pub rel_path: String,
    pub comment: Option<String>,
    pub source_run_id: Option<RunId>,
    pub exported_as: Option<String>,
    pub merge_base_version_id: Option<VersionId>,
    pub created_by: String,
}

// ---- Row decoding ----

pub(crate) const PROJECT_COLUMNS: &str = "id, name, created_at";

pub(crate) const ITEM_COLUMNS: &str = "id, project_id, parent_id, kind, name, slug, sort_index, \
     is_deleted, created_by, created_at, updated_at";

pub(crate) const ARTIFACT_COLUMNS: &str = "id, item_id, mime_type";

pub(crate) const VERSION_COLUMNS: &str = "id, item_id, version, size_bytes, sha256, rel_path, \
     comment, source_run_id, exported_as, merge_base_version_id, created_by, created_at";

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn conversion_error<E>(idx: usize, ty: Type, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| conversion_error(idx, Type::Integer, FromSqlError::OutOfRange(ms)))
}

fn unsigned(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let v: i64 = row.get(idx)?;
    u64::try_from(v).map_err(|_| conversion_error(idx, Type::Integer, FromSqlError::OutOfRange(v)))
}

impl Project {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: ProjectId::from_raw(row.get::<_, String>(0)?),
            name: row.get(1)?,
            created_at: timestamp(row, 2)?,
        })
    }
}

impl Item {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let kind: String = row.get(3)?;
        Ok(Self {
            id: ItemId::from_raw(row.get::<_, String>(0)?),
            project_id: ProjectId::from_raw(row.get::<_, String>(1)?),
            parent_id: row.get::<_, Option<String>>(2)?.map(ItemId::from_raw),
            kind: kind
                .parse()
                .map_err(|e| conversion_error(3, Type::Text, e))?,
            name: row.get(4)?,
            slug: row.get(5)?,
            sort_index: row.get(6)?,
            is_deleted: row.get(7)?,
            created_by: row.get(8)?,
            created_at: timestamp(row, 9)?,
            updated_at: timestamp(row, 10)?,
        })
    }
}

impl Artifact {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let mime: Option<String> = row.get(2)?;
        Ok(Self {
            id: ArtifactId::from_raw(row.get::<_, String>(0)?),
            item_id: ItemId::from_raw(row.get::<_, String>(1)?),
            mime_type: MimeType::from_stored(mime.as_deref()),
        })
    }
}

impl VersionRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let sha: String = row.get(4)?;
        Ok(Self {
            id: VersionId::from_raw(row.get::<_, String>(0)?),
            item_id: ItemId::from_raw(row.get::<_, String>(1)?),
            version: row.get(2)?,
            size_bytes: unsigned(row, 3)?,
            sha256: Digest::from_hex(&sha).map_err(|e| conversion_error(4, Type::Text, e))?,
            rel_path: row.get(5)?,
            comment: row.get(6)?,
            source_run_id: row.get::<_, Option<String>>(7)?.map(RunId::from_raw),
            exported_as: row.get(8)?,
            merge_base_version_id: row.get::<_, Option<String>>(9)?.map(VersionId::from_raw),
            created_by: row.get(10)?,
            created_at: timestamp(row, 11)?,
        })
    }
}
