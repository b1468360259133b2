//! Snapshot storage implementation.

use crate::snapshot::{
    parse_snapshot_name, snapshot_name, RunTag, SnapshotName, SNAPSHOT_SUFFIX,
};
use crate::{SnapshotError, SnapshotResult};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Default name of the snapshot directory inside the working directory.
pub const DEFAULT_SNAPSHOT_DIR: &str = ".rof_snapshots";

/// Configuration for snapshot storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotConfig {
    /// Name of the snapshot directory, relative to the working directory.
    pub dir_name: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            dir_name: DEFAULT_SNAPSHOT_DIR.to_string(),
        }
    }
}

impl SnapshotConfig {
    /// Check that `dir_name` names one directory directly inside the
    /// working directory.
    ///
    /// Cleanup deletes whatever this names, so `.`, `..`, absolute paths and
    /// nested paths are all refused.
    pub fn validate(&self) -> SnapshotResult<()> {
        let mut components = Path::new(&self.dir_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(SnapshotError::InvalidDirName(self.dir_name.clone())),
        }
    }
}

/// A file that could not be snapshotted or restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// Original file name.
    pub name: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Outcome of [`SnapshotStore::create_snapshots`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotReport {
    /// Files that now have a snapshot.
    pub saved: Vec<String>,
    /// Files left unprotected.
    pub skipped: Vec<SkippedFile>,
    /// Set when snapshotting was abandoned before any file was looked at.
    pub setup_error: Option<String>,
}

impl SnapshotReport {
    fn setup_failed(message: String) -> Self {
        Self {
            setup_error: Some(message),
            ..Self::default()
        }
    }
}

/// Outcome of [`SnapshotStore::restore_snapshots`].
#[derive(Debug, Clone, Default)]
pub struct RestoreReport {
    /// Files written back from their snapshot.
    pub restored: Vec<String>,
    /// Files whose restore failed.
    pub failed: Vec<SkippedFile>,
}

/// Storage for the snapshots of one working directory.
///
/// Snapshots are plain file copies in a single flat directory:
/// ```text
/// work_dir/
///   a.txt
///   .rof_snapshots/
///     a.txt.<run_tag>.bak
/// ```
pub struct SnapshotStore {
    /// Directory whose top-level files are protected.
    work_dir: PathBuf,

    /// Directory holding the snapshot files.
    snapshot_dir: PathBuf,
}

impl SnapshotStore {
    /// Create a snapshot store for `work_dir`.
    ///
    /// Fails if the configured directory name is not a plain name. Nothing
    /// is touched on disk until [`create_snapshots`](Self::create_snapshots).
    pub fn new(config: SnapshotConfig, work_dir: PathBuf) -> SnapshotResult<Self> {
        config.validate()?;
        let snapshot_dir = work_dir.join(&config.dir_name);
        Ok(Self {
            work_dir,
            snapshot_dir,
        })
    }

    /// Path of the snapshot directory.
    pub fn snapshot_dir(&self) -> &Path {
        &self.snapshot_dir
    }

    /// Copy every top-level regular file of the working directory.
    ///
    /// Best-effort: failures are logged and recorded in the report, and a
    /// failure on one file never stops the others.
    #[allow(clippy::cognitive_complexity)]
    pub async fn create_snapshots(&self, tag: &RunTag) -> SnapshotReport {
        if let Err(e) = fs::create_dir(&self.snapshot_dir).await {
            if e.kind() != ErrorKind::AlreadyExists {
                warn!("mkdir failed: {}: {}", self.snapshot_dir.display(), e);
                return SnapshotReport::setup_failed(e.to_string());
            }
            if let Err(reason) = self.check_owned().await {
                warn!(
                    "Not using {} for snapshots: {}",
                    self.snapshot_dir.display(),
                    reason
                );
                return SnapshotReport::setup_failed(reason);
            }
        }

        let names = match self.regular_files(&self.work_dir).await {
            Ok(names) => names,
            Err(e) => {
                warn!("opendir failed: {}: {}", self.work_dir.display(), e);
                return SnapshotReport::setup_failed(e.to_string());
            }
        };

        let mut report = SnapshotReport::default();

        for name in names {
            let src = self.work_dir.join(&name);
            let dst = self.snapshot_dir.join(snapshot_name(&name, tag));

            match fs::copy(&src, &dst).await {
                Ok(_) => {
                    debug!("Snapshotted: {}", name);
                    report.saved.push(name);
                }
                Err(e) => {
                    warn!("Failed to snapshot file {}: {}", name, e);
                    report.skipped.push(SkippedFile {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(
            "Created {} snapshots for run {} ({} skipped)",
            report.saved.len(),
            tag,
            report.skipped.len()
        );

        report
    }

    /// Put back every snapshot taken under `tag`.
    ///
    /// The snapshot directory is checked before anything is written: if it
    /// holds a snapshot from another run, nothing is restored and
    /// [`SnapshotError::GenerationMismatch`] is returned. A missing or
    /// unreadable snapshot directory is a warning and an empty report.
    #[allow(clippy::cognitive_complexity)]
    pub async fn restore_snapshots(&self, tag: &RunTag) -> SnapshotResult<RestoreReport> {
        if let Err(reason) = self.check_owned().await {
            warn!(
                "Not restoring from {}: {}",
                self.snapshot_dir.display(),
                reason
            );
            return Ok(RestoreReport::default());
        }

        let names = match self.regular_files(&self.snapshot_dir).await {
            Ok(names) => names,
            Err(e) => {
                warn!(
                    "opendir snapshot failed: {}: {}",
                    self.snapshot_dir.display(),
                    e
                );
                return Ok(RestoreReport::default());
            }
        };

        let plan = self.restore_plan(&names, tag)?;
        let mut report = RestoreReport::default();

        for (snapshot, original) in plan {
            match self.restore_file(&snapshot, &original, tag).await {
                Ok(()) => {
                    info!("Restored file: {}", original);
                    report.restored.push(original);
                }
                Err(e) => {
                    warn!("Failed to restore file {}: {}", original, e);
                    report.failed.push(SkippedFile {
                        name: original,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Remove the snapshot directory and everything in it.
    ///
    /// Best-effort: failures are logged and never escalated. Returns the
    /// number of snapshot files removed.
    #[allow(clippy::cognitive_complexity)]
    pub async fn cleanup(&self) -> usize {
        if let Err(reason) = self.check_owned().await {
            warn!("Not removing {}: {}", self.snapshot_dir.display(), reason);
            return 0;
        }

        let names = match self.regular_files(&self.snapshot_dir).await {
            Ok(names) => names,
            Err(_) => {
                warn!(
                    "Snapshot directory not found: {}",
                    self.snapshot_dir.display()
                );
                return 0;
            }
        };

        let mut removed = 0;
        for name in names {
            let path = self.snapshot_dir.join(&name);
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove file: {}: {}", path.display(), e),
            }
        }

        if let Err(e) = fs::remove_dir(&self.snapshot_dir).await {
            warn!(
                "Failed to remove directory: {}: {}",
                self.snapshot_dir.display(),
                e
            );
        }

        debug!("Cleaned up {} snapshot files", removed);
        removed
    }

    /// Match snapshot files to the originals they restore.
    ///
    /// Fails on the first snapshot that carries another run's tag.
    fn restore_plan(
        &self,
        names: &[String],
        tag: &RunTag,
    ) -> SnapshotResult<Vec<(String, String)>> {
        let mut plan = Vec::new();

        for name in names {
            match parse_snapshot_name(name, tag) {
                SnapshotName::Current { original } => {
                    plan.push((name.clone(), original.to_string()));
                }
                SnapshotName::Foreign => {
                    return Err(SnapshotError::generation_mismatch(
                        tag.as_str(),
                        name.as_str(),
                        &self.snapshot_dir,
                    ));
                }
                SnapshotName::Malformed => {
                    debug!("Skipping snapshot not in expected format: {}", name);
                }
                SnapshotName::NotSnapshot => {}
            }
        }

        Ok(plan)
    }

    /// Copy one snapshot back over its original.
    ///
    /// The bytes are staged next to the original and renamed into place.
    async fn restore_file(
        &self,
        snapshot: &str,
        original: &str,
        tag: &RunTag,
    ) -> SnapshotResult<()> {
        let src = self.snapshot_dir.join(snapshot);
        let dst = self.work_dir.join(original);
        let staging = self.work_dir.join(format!(".rof-restore.{tag}"));

        let staged = match fs::copy(&src, &staging).await {
            Ok(_) => fs::rename(&staging, &dst).await,
            Err(e) => Err(e),
        };

        if let Err(e) = staged {
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }

        Ok(())
    }

    /// Check that the snapshot directory holds nothing but snapshots.
    ///
    /// A missing directory counts as owned. Anything whose name lacks the
    /// `.bak` suffix means the directory belongs to someone else.
    async fn check_owned(&self) -> Result<(), String> {
        let mut entries = match fs::read_dir(&self.snapshot_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.to_string()),
        };

        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let name = entry.file_name();
                    if !name.to_string_lossy().ends_with(SNAPSHOT_SUFFIX) {
                        return Err(format!("contains non-snapshot entry {:?}", name));
                    }
                }
                Ok(None) => return Ok(()),
                Err(e) => return Err(e.to_string()),
            }
        }
    }

    /// Names of the regular files directly inside `dir`, sorted.
    ///
    /// Symlinks, directories and other special files are left out.
    async fn regular_files(&self, dir: &Path) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();

        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = match entry.file_type().await {
                Ok(file_type) => file_type,
                Err(e) => {
                    warn!("Failed to stat {:?}: {}", entry.path(), e);
                    continue;
                }
            };
            if !file_type.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => warn!("Skipping file with non UTF-8 name: {:?}", name),
            }
        }

        names.sort();
        Ok(names)
    }
}
