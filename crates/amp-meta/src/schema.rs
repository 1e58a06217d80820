use rusqlite::Connection;

use crate::error::{MetaError, MetaResult};

/// Current schema revision, recorded in `schema_meta`.
pub const SCHEMA_VERSION: i64 = 1;

const BOOTSTRAP: &str = "
CREATE TABLE IF NOT EXISTS project (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS project_item (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES project(id) ON DELETE CASCADE,
    parent_id TEXT REFERENCES project_item(id) ON DELETE CASCADE,
    kind TEXT NOT NULL CHECK (kind IN ('folder', 'file')),
    name TEXT NOT NULL,
    slug TEXT NOT NULL,
    sort_index INTEGER NOT NULL DEFAULT 0,
    is_deleted INTEGER NOT NULL DEFAULT 0,
    created_by TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- NULLs are distinct in a plain UNIQUE constraint, so top-level siblings
-- would never collide. Index the parent through IFNULL instead.
CREATE UNIQUE INDEX IF NOT EXISTS u_item_parent_slug
    ON project_item(project_id, IFNULL(parent_id, ''), slug);

CREATE INDEX IF NOT EXISTS idx_item_project ON project_item(project_id);

CREATE TABLE IF NOT EXISTS artifact (
    id TEXT PRIMARY KEY,
    item_id TEXT NOT NULL UNIQUE REFERENCES project_item(id) ON DELETE CASCADE,
    mime_type TEXT
);

CREATE TABLE IF NOT EXISTS artifact_version (
    id TEXT PRIMARY KEY,
    item_id TEXT NOT NULL REFERENCES project_item(id) ON DELETE CASCADE,
    version INTEGER NOT NULL CHECK (version > 0),
    size_bytes INTEGER NOT NULL CHECK (size_bytes >= 0),
    sha256 TEXT NOT NULL,
    rel_path TEXT NOT NULL,
    comment TEXT,
    source_run_id TEXT,
    exported_as TEXT,
    merge_base_version_id TEXT REFERENCES artifact_version(id),
    created_by TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    UNIQUE (item_id, version)
);

CREATE TRIGGER IF NOT EXISTS artifact_version_immutable
    BEFORE UPDATE ON artifact_version
BEGIN
    SELECT RAISE(ABORT, 'artifact versions are immutable');
END;

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// Create all tables, indexes and triggers if they do not exist yet.
///
/// Refuses a database whose recorded revision is newer than [`SCHEMA_VERSION`].
pub fn bootstrap(conn: &Connection) -> MetaResult<()> {
    conn.execute_batch(BOOTSTRAP)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;
    match stored_version(conn)? {
        Some(v) if v <= SCHEMA_VERSION => Ok(()),
        Some(v) => Err(MetaError::Corrupt(format!(
            "schema version {v} is newer than supported version {SCHEMA_VERSION}"
        ))),
        None => Err(MetaError::Corrupt("unreadable schema version".into())),
    }
}

/// Schema revision stored in the database, if any.
pub fn stored_version(conn: &Connection) -> MetaResult<Option<i64>> {
    use rusqlite::OptionalExtension;

    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM schema_meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.and_then(|v| v.parse().ok()))
}
