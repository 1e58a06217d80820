use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use amp_types::{slugify, ArtifactId, IdGenerator, ItemId, ItemKind, ProjectId, VersionSelector};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::error::{is_constraint_violation, MetaError, MetaResult};
use crate::rows::{
    now_millis, Artifact, Item, NewFileItem, NewVersion, Project, VersionRow, ARTIFACT_COLUMNS,
    ITEM_COLUMNS, PROJECT_COLUMNS, VERSION_COLUMNS,
};
use crate::schema;

/// How many slug candidates are tried before giving up on an insert.
pub const MAX_SLUG_ATTEMPTS: usize = 16;

/// Random bytes appended to a colliding slug (4 hex characters).
const SLUG_SUFFIX_BYTES: usize = 2;

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// SQLite-backed metadata store.
///
/// Every operation opens its own connection, so the store is cheap to share
/// across threads. Writers serialize on `BEGIN IMMEDIATE`; readers see the
/// last committed snapshot.
pub struct MetadataStore {
    path: PathBuf,
    ids: Arc<IdGenerator>,
}

impl MetadataStore {
    /// Open (or create) the database at `path` and bootstrap its schema.
    pub fn open(path: impl AsRef<Path>, ids: Arc<IdGenerator>) -> MetaResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self { path, ids };
        let conn = store.connection()?;
        schema::bootstrap(&conn)?;
        debug!(path = %store.path.display(), "metadata store opened");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ids(&self) -> &Arc<IdGenerator> {
        &self.ids
    }

    fn connection(&self) -> MetaResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    /// Run `f` inside a single `BEGIN IMMEDIATE` transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back when it
    /// returns `Err`. Any error type that can absorb a [`MetaError`] works,
    /// so callers can interleave their own fallible steps (blob writes) with
    /// metadata writes and still get all-or-nothing metadata.
    pub fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<MetaError>,
        F: FnOnce(&MetaTx<'_>) -> Result<T, E>,
    {
        let mut conn = self.connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(MetaError::from)?;
        let handle = MetaTx {
            conn: &tx,
            ids: &self.ids,
        };
        match f(&handle) {
            Ok(value) => {
                tx.commit().map_err(MetaError::from)?;
                Ok(value)
            }
            Err(e) => {
                debug!("metadata transaction rolled back");
                Err(e)
            }
        }
    }

    // ---- Projects ----

    /// Create a project. Names are not required to be unique.
    pub fn create_project(&self, name: &str) -> MetaResult<Project> {
        let id = self.ids.project_id();
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO project (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![id.as_str(), name, now_millis()],
        )?;
        info!(project = %id, name, "project created");
        find_project(&conn, &id)?.ok_or_else(|| MetaError::not_found("project", &id))
    }

    /// All projects, newest first.
    pub fn list_projects(&self) -> MetaResult<Vec<Project>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map([], Project::from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn get_project(&self, id: &ProjectId) -> MetaResult<Option<Project>> {
        find_project(&self.connection()?, id)
    }

    /// Delete a project together with its items, artifacts and versions.
    ///
    /// Blob files are left in place; reconciliation reclaims them.
    pub fn delete_project(&self, id: &ProjectId) -> MetaResult<()> {
        let conn = self.connection()?;
        let n = conn.execute("DELETE FROM project WHERE id = ?1", [id.as_str()])?;
        if n == 0 {
            return Err(MetaError::not_found("project", id));
        }
        info!(project = %id, "project deleted");
        Ok(())
    }

    // ---- Items and artifacts ----

    pub fn get_item(&self, id: &ItemId) -> MetaResult<Option<Item>> {
        find_item(&self.connection()?, id)
    }

    pub fn get_artifact(&self, id: &ArtifactId) -> MetaResult<Option<Artifact>> {
        find_artifact(&self.connection()?, id)
    }

    /// Live items of a project, grouped by parent and ordered by `sort_index`, then slug.
    pub fn list_items(&self, project_id: &ProjectId) -> MetaResult<Vec<Item>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM project_item
             WHERE project_id = ?1 AND is_deleted = 0
             ORDER BY IFNULL(parent_id, ''), sort_index, slug"
        ))?;
        let rows = stmt.query_map([project_id.as_str()], Item::from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Artifacts bound to live file items of a project.
    pub fn list_artifacts(&self, project_id: &ProjectId) -> MetaResult<Vec<Artifact>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT a.id, a.item_id, a.mime_type FROM artifact a
             JOIN project_item i ON i.id = a.item_id
             WHERE i.project_id = ?1 AND i.is_deleted = 0
             ORDER BY IFNULL(i.parent_id, ''), i.sort_index, i.slug",
        )?;
        let rows = stmt.query_map([project_id.as_str()], Artifact::from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    // ---- Versions ----

    /// Versions of an artifact in ascending order. Unknown artifacts have no history.
    pub fn get_artifact_history(&self, artifact_id: &ArtifactId) -> MetaResult<Vec<VersionRow>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {VERSION_COLUMNS} FROM artifact_version
             WHERE item_id = (SELECT item_id FROM artifact WHERE id = ?1)
             ORDER BY version ASC"
        ))?;
        let rows = stmt.query_map([artifact_id.as_str()], VersionRow::from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn resolve_version(
        &self,
        artifact_id: &ArtifactId,
        selector: VersionSelector,
    ) -> MetaResult<VersionRow> {
        resolve(&self.connection()?, artifact_id, selector)
    }

    /// Every committed version row, ordered by item then version.
    pub fn all_versions(&self) -> MetaResult<Vec<VersionRow>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {VERSION_COLUMNS} FROM artifact_version ORDER BY item_id, version"
        ))?;
        let rows = stmt.query_map([], VersionRow::from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Relative blob paths referenced by committed versions.
    pub fn all_version_paths(&self) -> MetaResult<Vec<String>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT rel_path FROM artifact_version ORDER BY rel_path")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }
}

impl fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Handle to an open write transaction. Only reachable through
/// [`MetadataStore::write`].
pub struct MetaTx<'a> {
    conn: &'a Connection,
    ids: &'a IdGenerator,
}

impl MetaTx<'_> {
    pub fn project_exists(&self, id: &ProjectId) -> MetaResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM project WHERE id = ?1", [id.as_str()], |r| {
                r.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    pub fn item(&self, id: &ItemId) -> MetaResult<Option<Item>> {
        find_item(self.conn, id)
    }

    pub fn artifact(&self, id: &ArtifactId) -> MetaResult<Option<Artifact>> {
        find_artifact(self.conn, id)
    }

    /// Insert a file item and its artifact under a collision-free slug.
    pub fn create_item_and_artifact(&self, new: &NewFileItem) -> MetaResult<(Item, Artifact)> {
        self.require_project(&new.project_id)?;
        self.check_parent(&new.project_id, new.parent_id.as_ref())?;

        let item = self.insert_item(
            &new.project_id,
            new.parent_id.as_ref(),
            ItemKind::File,
            &new.name,
            &new.created_by,
        )?;

        let artifact_id = self.ids.artifact_id();
        self.conn.execute(
            "INSERT INTO artifact (id, item_id, mime_type) VALUES (?1, ?2, ?3)",
            params![artifact_id.as_str(), item.id.as_str(), new.mime_type.as_str()],
        )?;
        debug!(artifact = %artifact_id, item = %item.id, "artifact row inserted");

        Ok((
            item.clone(),
            Artifact {
                id: artifact_id,
                item_id: item.id,
                mime_type: new.mime_type,
            },
        ))
    }

    pub fn create_folder(
        &self,
        project_id: &ProjectId,
        parent: Option<&ItemId>,
        name: &str,
        created_by: &str,
    ) -> MetaResult<Item> {
        self.require_project(project_id)?;
        self.check_parent(project_id, parent)?;
        self.insert_item(project_id, parent, ItemKind::Folder, name, created_by)
    }

    /// `max(version) + 1` for the item, starting at 1.
    pub fn next_version_number(&self, item_id: &ItemId) -> MetaResult<u32> {
        let max: Option<i64> = self.conn.query_row(
            "SELECT MAX(version) FROM artifact_version WHERE item_id = ?1",
            [item_id.as_str()],
            |r| r.get(0),
        )?;
        let next = max.unwrap_or(0) + 1;
        u32::try_from(next).map_err(|_| {
            MetaError::ConstraintViolation(format!("version space exhausted for {item_id}"))
        })
    }

    pub fn insert_version(&self, new: &NewVersion) -> MetaResult<VersionRow> {
        if new.version == 0 {
            return Err(MetaError::InvalidArgument("versions start at 1".into()));
        }
        let size = i64::try_from(new.size_bytes)
            .map_err(|_| MetaError::InvalidArgument(format!("size {} too large", new.size_bytes)))?;
        let id = self.ids.version_id();

        let inserted = self.conn.execute(
            "INSERT INTO artifact_version (id, item_id, version, size_bytes, sha256, rel_path,
                comment, source_run_id, exported_as, merge_base_version_id, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                id.as_str(),
                new.item_id.as_str(),
                new.version,
                size,
                new.sha256.as_str(),
                new.rel_path,
                new.comment,
                new.source_run_id.as_ref().map(|r| r.as_str()),
                new.exported_as,
                new.merge_base_version_id.as_ref().map(|v| v.as_str()),
                new.created_by,
                now_millis(),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                return Err(MetaError::ConstraintViolation(format!(
                    "version {} of {} already exists",
                    new.version, new.item_id
                )));
            }
            Err(e) => return Err(e.into()),
        }

        let row = self
            .conn
            .query_row(
                &format!("SELECT {VERSION_COLUMNS} FROM artifact_version WHERE id = ?1"),
                [id.as_str()],
                VersionRow::from_row,
            )
            .optional()?;
        row.ok_or_else(|| MetaError::not_found("version", &id))
    }

    /// Bump `updated_at` on an item.
    pub fn touch_item(&self, id: &ItemId) -> MetaResult<()> {
        let n = self.conn.execute(
            "UPDATE project_item SET updated_at = ?2 WHERE id = ?1",
            params![id.as_str(), now_millis()],
        )?;
        if n == 0 {
            return Err(MetaError::not_found("item", id));
        }
        Ok(())
    }

    pub fn resolve_version(
        &self,
        artifact_id: &ArtifactId,
        selector: VersionSelector,
    ) -> MetaResult<VersionRow> {
        resolve(self.conn, artifact_id, selector)
    }

    /// Soft-delete an item. Children of a folder go with it.
    pub fn mark_item_deleted(&self, id: &ItemId) -> MetaResult<()> {
        let n = self.conn.execute(
            "UPDATE project_item SET is_deleted = 1, updated_at = ?2
             WHERE (id = ?1 OR parent_id = ?1) AND is_deleted = 0",
            params![id.as_str(), now_millis()],
        )?;
        if n == 0 {
            return Err(MetaError::not_found("item", id));
        }
        info!(item = %id, rows = n, "item marked deleted");
        Ok(())
    }

    fn require_project(&self, id: &ProjectId) -> MetaResult<()> {
        if self.project_exists(id)? {
            Ok(())
        } else {
            Err(MetaError::not_found("project", id))
        }
    }

    fn check_parent(&self, project_id: &ProjectId, parent: Option<&ItemId>) -> MetaResult<()> {
        let Some(parent_id) = parent else {
            return Ok(());
        };
        let parent = match self.item(parent_id)? {
            Some(item) if !item.is_deleted => item,
            _ => return Err(MetaError::not_found("item", parent_id)),
        };
        if &parent.project_id != project_id {
            return Err(MetaError::InvalidArgument(format!(
                "parent {parent_id} belongs to another project"
            )));
        }
        if parent.kind != ItemKind::Folder {
            return Err(MetaError::InvalidArgument(format!(
                "parent {parent_id} is not a folder"
            )));
        }
        Ok(())
    }

    fn slug_taken(
        &self,
        project_id: &ProjectId,
        parent: Option<&ItemId>,
        slug: &str,
    ) -> MetaResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM project_item
                 WHERE project_id = ?1 AND IFNULL(parent_id, '') = IFNULL(?2, '') AND slug = ?3",
                params![project_id.as_str(), parent.map(|p| p.as_str()), slug],
                |r| r.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn next_sort_index(&self, project_id: &ProjectId, parent: Option<&ItemId>) -> MetaResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(MAX(sort_index) + 1, 0) FROM project_item
             WHERE project_id = ?1 AND IFNULL(parent_id, '') = IFNULL(?2, '')",
            params![project_id.as_str(), parent.map(|p| p.as_str())],
            |r| r.get(0),
        )?)
    }

    fn insert_item(
        &self,
        project_id: &ProjectId,
        parent: Option<&ItemId>,
        kind: ItemKind,
        name: &str,
        created_by: &str,
    ) -> MetaResult<Item> {
        let mut base = slugify(name);
        if base.is_empty() {
            base = self.ids.next_id(kind.as_str());
        }
        let sort_index = self.next_sort_index(project_id, parent)?;
        let now = now_millis();

        for attempt in 0..MAX_SLUG_ATTEMPTS {
            let candidate = if attempt == 0 {
                base.clone()
            } else {
                format!("{base}-{}", self.ids.suffix(SLUG_SUFFIX_BYTES))
            };
            if self.slug_taken(project_id, parent, &candidate)? {
                warn!(slug = %candidate, attempt, "slug collision");
                continue;
            }

            let id = self.ids.item_id();
            let inserted = self.conn.execute(
                "INSERT INTO project_item (id, project_id, parent_id, kind, name, slug,
                    sort_index, is_deleted, created_by, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, ?9)",
                params![
                    id.as_str(),
                    project_id.as_str(),
                    parent.map(|p| p.as_str()),
                    kind.as_str(),
                    name,
                    candidate,
                    sort_index,
                    created_by,
                    now,
                ],
            );
            match inserted {
                Ok(_) => {
                    debug!(item = %id, slug = %candidate, %kind, "item inserted");
                    return find_item(self.conn, &id)?
                        .ok_or_else(|| MetaError::not_found("item", &id));
                }
                Err(e) if is_constraint_violation(&e) => {
                    warn!(slug = %candidate, attempt, "item insert hit unique index, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(MetaError::ConstraintViolation(format!(
            "no free slug for {name:?} after {MAX_SLUG_ATTEMPTS} attempts"
        )))
    }
}

// ---- Shared queries ----

fn find_project(conn: &Connection, id: &ProjectId) -> MetaResult<Option<Project>> {
    Ok(conn
        .query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM project WHERE id = ?1"),
            [id.as_str()],
            Project::from_row,
        )
        .optional()?)
}

fn find_item(conn: &Connection, id: &ItemId) -> MetaResult<Option<Item>> {
    Ok(conn
        .query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM project_item WHERE id = ?1"),
            [id.as_str()],
            Item::from_row,
        )
        .optional()?)
}

fn find_artifact(conn: &Connection, id: &ArtifactId) -> MetaResult<Option<Artifact>> {
    Ok(conn
        .query_row(
            &format!("SELECT {ARTIFACT_COLUMNS} FROM artifact WHERE id = ?1"),
            [id.as_str()],
            Artifact::from_row,
        )
        .optional()?)
}

fn resolve(
    conn: &Connection,
    artifact_id: &ArtifactId,
    selector: VersionSelector,
) -> MetaResult<VersionRow> {
    let artifact = find_artifact(conn, artifact_id)?
        .ok_or_else(|| MetaError::not_found("artifact", artifact_id))?;

    let row = match selector {
        VersionSelector::Latest => conn
            .query_row(
                &format!(
                    "SELECT {VERSION_COLUMNS} FROM artifact_version
                     WHERE item_id = ?1 ORDER BY version DESC LIMIT 1"
                ),
                [artifact.item_id.as_str()],
                VersionRow::from_row,
            )
            .optional()?,
        VersionSelector::Number(n) => conn
            .query_row(
                &format!(
                    "SELECT {VERSION_COLUMNS} FROM artifact_version
                     WHERE item_id = ?1 AND version = ?2"
                ),
                params![artifact.item_id.as_str(), n],
                VersionRow::from_row,
            )
            .optional()?,
    };

    row.ok_or_else(|| MetaError::not_found("version", format!("{artifact_id}@{selector}")))
}
