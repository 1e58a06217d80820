use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use amp_crypto::ContentHasher;
use amp_meta::{Artifact, Item, MetadataStore, NewFileItem, NewVersion, Project, VersionRow};
use amp_store::{BlobKey, BlobStore, FsBlobStore, StoreError};
use amp_types::{ArtifactId, IdGenerator, ItemId, MimeType, ProjectId, VersionSelector};
use tracing::{debug, info, warn};

use crate::config::AmpConfig;
use crate::error::{AmpError, AmpResult};
use crate::options::{AddArtifact, AddedArtifact, AppendVersion};
use crate::report::{GcReport, VerifyIssue, VerifyReport};
use crate::viewer::viewer_for;

/// High-level Amp API.
///
/// Ties the metadata store and a blob store together. Every write follows the
/// same order: hash, open a metadata transaction, write the blob, insert the
/// version row, commit. A failure anywhere rolls the metadata back; a blob
/// written before the failure becomes an orphan for [`Amp::collect_garbage`].
pub struct Amp {
    data_dir: PathBuf,
    config: AmpConfig,
    meta: MetadataStore,
    blobs: Arc<dyn BlobStore>,
    hasher: ContentHasher,
}

impl Amp {
    /// Open the data directory, reading `config.toml` when present.
    pub fn open(data_dir: impl AsRef<Path>) -> AmpResult<Self> {
        let data_dir = data_dir.as_ref();
        let config = AmpConfig::load(data_dir)?;
        Self::open_with(data_dir, config, Arc::new(IdGenerator::from_entropy()))
    }

    /// Open with an explicit configuration and identifier source.
    pub fn open_with(
        data_dir: impl AsRef<Path>,
        config: AmpConfig,
        ids: Arc<IdGenerator>,
    ) -> AmpResult<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;
        let blobs = FsBlobStore::open(data_dir)?.with_sync(config.sync_blobs);
        Self::with_blob_store(data_dir, config, ids, Arc::new(blobs))
    }

    /// Open with a caller-supplied blob backend.
    pub fn with_blob_store(
        data_dir: impl AsRef<Path>,
        config: AmpConfig,
        ids: Arc<IdGenerator>,
        blobs: Arc<dyn BlobStore>,
    ) -> AmpResult<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let meta = MetadataStore::open(data_dir.join(&config.db_file), ids)?;
        let hasher = ContentHasher::SHA256;
        info!(data_dir = %data_dir.display(), hash = hasher.algorithm(), "amp opened");
        Ok(Self {
            data_dir,
            config,
            meta,
            blobs,
            hasher,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &AmpConfig {
        &self.config
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.meta
    }

    pub fn ids(&self) -> &Arc<IdGenerator> {
        self.meta.ids()
    }

    // ---- Projects ----

    pub fn create_project(&self, name: &str) -> AmpResult<Project> {
        Ok(self.meta.create_project(name)?)
    }

    /// Newest first.
    pub fn list_projects(&self) -> AmpResult<Vec<Project>> {
        Ok(self.meta.list_projects()?)
    }

    pub fn get_project(&self, id: &ProjectId) -> AmpResult<Option<Project>> {
        Ok(self.meta.get_project(id)?)
    }

    /// Delete a project and all of its metadata. Its blobs become orphans.
    pub fn delete_project(&self, id: &ProjectId) -> AmpResult<()> {
        Ok(self.meta.delete_project(id)?)
    }

    // ---- Items ----

    pub fn create_folder(
        &self,
        project_id: &ProjectId,
        name: &str,
        parent: Option<&ItemId>,
    ) -> AmpResult<Item> {
        let creator = &self.config.default_creator;
        let folder = self
            .meta
            .write(|tx| tx.create_folder(project_id, parent, name, creator))?;
        info!(project = %project_id, item = %folder.id, slug = %folder.slug, "folder created");
        Ok(folder)
    }

    /// Live items of a project.
    pub fn list_items(&self, project_id: &ProjectId) -> AmpResult<Vec<Item>> {
        self.require_project(project_id)?;
        Ok(self.meta.list_items(project_id)?)
    }

    pub fn list_artifacts(&self, project_id: &ProjectId) -> AmpResult<Vec<Artifact>> {
        self.require_project(project_id)?;
        Ok(self.meta.list_artifacts(project_id)?)
    }

    pub fn artifact(&self, id: &ArtifactId) -> AmpResult<Artifact> {
        self.meta
            .get_artifact(id)?
            .ok_or_else(|| AmpError::not_found("artifact", id))
    }

    /// Soft-delete an item. Versions and blobs are kept.
    pub fn remove_item(&self, id: &ItemId) -> AmpResult<()> {
        Ok(self.meta.write(|tx| tx.mark_item_deleted(id))?)
    }

    // ---- Adding content ----

    /// Add a file from disk as a new artifact at version 1.
    pub fn add_artifact_from_file(
        &self,
        project_id: &ProjectId,
        path: impl AsRef<Path>,
        opts: AddArtifact,
    ) -> AmpResult<AddedArtifact> {
        let path = path.as_ref();
        self.require_project(project_id)?;
        let data = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                AmpError::InvalidArgument(format!("{} has no file name", path.display()))
            })?;
        self.add_artifact_bytes(project_id, &file_name, &data, opts)
    }

    /// Add in-memory bytes as a new artifact at version 1.
    ///
    /// `file_name` decides the MIME type and, unless `opts.name` is set, the
    /// display name.
    pub fn add_artifact_bytes(
        &self,
        project_id: &ProjectId,
        file_name: &str,
        data: &[u8],
        opts: AddArtifact,
    ) -> AmpResult<AddedArtifact> {
        let digest = self.hasher.digest(data);
        let mime_type = MimeType::detect(file_name);
        let name = opts.name.unwrap_or_else(|| file_name.to_string());
        let created_by = opts
            .created_by
            .unwrap_or_else(|| self.config.default_creator.clone());

        let added = self.meta.write(|tx| -> AmpResult<AddedArtifact> {
            if !tx.project_exists(project_id)? {
                return Err(AmpError::not_found("project", project_id));
            }

            let (item, artifact) = tx.create_item_and_artifact(&NewFileItem {
                project_id: project_id.clone(),
                parent_id: opts.parent.clone(),
                name: name.clone(),
                mime_type,
                created_by: created_by.clone(),
            })?;

            let version = tx.next_version_number(&item.id)?;
            let key = BlobKey::new(item.id.clone(), version);
            let rel_path = self.blobs.put(&key, data)?;

            tx.insert_version(&NewVersion {
                item_id: item.id.clone(),
                version,
                size_bytes: data.len() as u64,
                sha256: digest.clone(),
                rel_path,
                comment: opts.comment.clone(),
                source_run_id: opts.source_run_id.clone(),
                exported_as: opts.exported_as.clone(),
                merge_base_version_id: None,
                created_by: created_by.clone(),
            })?;

            Ok(AddedArtifact {
                artifact_id: artifact.id,
                item_id: item.id,
                version,
            })
        })?;

        info!(
            artifact = %added.artifact_id,
            item = %added.item_id,
            version = added.version,
            sha256 = digest.short_hex(),
            "artifact added"
        );
        Ok(added)
    }

    /// Append a new version to an existing artifact.
    pub fn append_version(
        &self,
        artifact_id: &ArtifactId,
        data: &[u8],
        opts: AppendVersion,
    ) -> AmpResult<AddedArtifact> {
        let digest = self.hasher.digest(data);
        let created_by = opts
            .created_by
            .unwrap_or_else(|| self.config.default_creator.clone());

        let added = self.meta.write(|tx| -> AmpResult<AddedArtifact> {
            let artifact = tx
                .artifact(artifact_id)?
                .ok_or_else(|| AmpError::not_found("artifact", artifact_id))?;
            match tx.item(&artifact.item_id)? {
                Some(item) if !item.is_deleted => {}
                _ => return Err(AmpError::not_found("item", &artifact.item_id)),
            }

            let merge_base_version_id = match opts.merge_base {
                Some(selector) => Some(tx.resolve_version(artifact_id, selector)?.id),
                None => None,
            };

            let version = tx.next_version_number(&artifact.item_id)?;
            let key = BlobKey::new(artifact.item_id.clone(), version);
            let rel_path = self.blobs.put(&key, data)?;

            tx.insert_version(&NewVersion {
                item_id: artifact.item_id.clone(),
                version,
                size_bytes: data.len() as u64,
                sha256: digest.clone(),
                rel_path,
                comment: opts.comment.clone(),
                source_run_id: opts.source_run_id.clone(),
                exported_as: opts.exported_as.clone(),
                merge_base_version_id,
                created_by: created_by.clone(),
            })?;
            tx.touch_item(&artifact.item_id)?;

            Ok(AddedArtifact {
                artifact_id: artifact.id,
                item_id: artifact.item_id,
                version,
            })
        })?;

        info!(
            artifact = %added.artifact_id,
            version = added.version,
            sha256 = digest.short_hex(),
            "version appended"
        );
        Ok(added)
    }

    pub fn append_version_from_file(
        &self,
        artifact_id: &ArtifactId,
        path: impl AsRef<Path>,
        opts: AppendVersion,
    ) -> AmpResult<AddedArtifact> {
        let data = fs::read(path.as_ref())?;
        self.append_version(artifact_id, &data, opts)
    }

    // ---- Reading ----

    /// All versions of an artifact, ascending. Empty for unknown artifacts.
    pub fn history(&self, artifact_id: &ArtifactId) -> AmpResult<Vec<VersionRow>> {
        Ok(self.meta.get_artifact_history(artifact_id)?)
    }

    pub fn resolve(
        &self,
        artifact_id: &ArtifactId,
        selector: VersionSelector,
    ) -> AmpResult<VersionRow> {
        Ok(self.meta.resolve_version(artifact_id, selector)?)
    }

    /// Bytes of a version, checked against the recorded digest.
    pub fn read_version(
        &self,
        artifact_id: &ArtifactId,
        selector: VersionSelector,
    ) -> AmpResult<Vec<u8>> {
        let row = self.resolve(artifact_id, selector)?;
        self.load(artifact_id, &row, true)
    }

    /// A version's bytes rendered for display by the viewer for its MIME type.
    pub fn render_version(
        &self,
        artifact_id: &ArtifactId,
        selector: VersionSelector,
    ) -> AmpResult<String> {
        let artifact = self.artifact(artifact_id)?;
        let data = self.read_version(artifact_id, selector)?;
        Ok(viewer_for(artifact.mime_type).render(&data))
    }

    /// Copy a version's bytes to `out`, or to
    /// `<export_dir>/<artifactId>-v<NNNN><ext>` when `out` is `None`.
    pub fn export_version(
        &self,
        artifact_id: &ArtifactId,
        selector: VersionSelector,
        out: Option<&Path>,
    ) -> AmpResult<PathBuf> {
        let artifact = self.artifact(artifact_id)?;
        let row = self.resolve(artifact_id, selector)?;
        let data = self.load(artifact_id, &row, self.config.verify_on_export)?;

        let dest = match out {
            Some(path) => path.to_path_buf(),
            None => self.config.export_dir.join(format!(
                "{artifact_id}-v{:04}{}",
                row.version,
                artifact.mime_type.extension()
            )),
        };
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, &data)?;

        info!(
            artifact = %artifact_id,
            version = row.version,
            dest = %dest.display(),
            "version exported"
        );
        Ok(dest)
    }

    /// Read the blob at the row's recorded path.
    fn load(&self, artifact_id: &ArtifactId, row: &VersionRow, verify: bool) -> AmpResult<Vec<u8>> {
        let key = BlobKey::from_rel_path(&row.rel_path)?;
        let data = self
            .blobs
            .get(&key)?
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;

        if verify
            && (data.len() as u64 != row.size_bytes || !self.hasher.verify(&data, &row.sha256))
        {
            let actual = self.hasher.digest(&data);
            warn!(
                artifact = %artifact_id,
                version = row.version,
                expected = row.sha256.short_hex(),
                actual = actual.short_hex(),
                "integrity check failed"
            );
            return Err(AmpError::Integrity {
                artifact: artifact_id.clone(),
                version: row.version,
                expected: row.sha256.clone(),
                actual,
            });
        }
        debug!(%key, bytes = data.len(), "version loaded");
        Ok(data)
    }

    // ---- Reconciliation ----

    /// Blobs that no committed version references.
    ///
    /// Run while no writes are in flight: a blob written by an open
    /// transaction looks like an orphan until it commits.
    pub fn find_orphans(&self) -> AmpResult<Vec<BlobKey>> {
        let referenced: HashSet<String> = self.meta.all_version_paths()?.into_iter().collect();
        let orphans: Vec<BlobKey> = self
            .blobs
            .list()?
            .into_iter()
            .filter(|key| !referenced.contains(&key.rel_path()))
            .collect();
        if !orphans.is_empty() {
            warn!(count = orphans.len(), "orphan blobs found");
        }
        Ok(orphans)
    }

    /// Delete every orphan blob and every partial file from an interrupted write.
    pub fn collect_garbage(&self) -> AmpResult<GcReport> {
        let mut report = GcReport::default();
        for key in self.find_orphans()? {
            let size = self.blobs.size(&key)?.unwrap_or(0);
            if self.blobs.delete(&key)? {
                report.bytes_freed += size;
                report.removed.push(key.rel_path());
            }
        }
        for (rel_path, size) in self.blobs.purge_temp_files()? {
            report.bytes_freed += size;
            report.removed.push(rel_path);
        }
        info!(
            removed = report.removed.len(),
            bytes = report.bytes_freed,
            "garbage collected"
        );
        Ok(report)
    }

    /// Re-hash every committed version and list anything missing or corrupt.
    pub fn verify_all(&self) -> AmpResult<VerifyReport> {
        let mut report = VerifyReport::default();
        for row in self.meta.all_versions()? {
            report.checked += 1;
            let Ok(key) = BlobKey::from_rel_path(&row.rel_path) else {
                warn!(path = %row.rel_path, "version row has an invalid blob path");
                report.issues.push(VerifyIssue::InvalidPath {
                    item_id: row.item_id,
                    version: row.version,
                    rel_path: row.rel_path,
                });
                continue;
            };
            match self.blobs.reader(&key)? {
                None => {
                    warn!(%key, "blob missing");
                    report.issues.push(VerifyIssue::Missing {
                        item_id: row.item_id,
                        version: row.version,
                        rel_path: row.rel_path,
                    });
                }
                Some(reader) => {
                    let (actual, size) = self.hasher.digest_reader(reader)?;
                    if actual != row.sha256 || size != row.size_bytes {
                        warn!(%key, "blob corrupt");
                        report.issues.push(VerifyIssue::Corrupt {
                            item_id: row.item_id,
                            version: row.version,
                            rel_path: row.rel_path,
                            expected: row.sha256.to_string(),
                            actual: actual.to_string(),
                        });
                    }
                }
            }
        }
        report.orphans = self
            .find_orphans()?
            .iter()
            .map(BlobKey::rel_path)
            .collect();
        report.orphans.extend(self.blobs.stale_temp_files()?);
        Ok(report)
    }

    fn require_project(&self, id: &ProjectId) -> AmpResult<()> {
        match self.meta.get_project(id)? {
            Some(_) => Ok(()),
            None => Err(AmpError::not_found("project", id)),
        }
    }
}

impl std::fmt::Debug for Amp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Amp")
            .field("data_dir", &self.data_dir)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
