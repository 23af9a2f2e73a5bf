//! Backup job executor - Orchestrates the actual backup process.
//!
//! A run goes through five steps, each gated on the previous one:
//! - Validate: snapshot root exists and the source is a subvolume
//! - Snapshot: read-only snapshot named `<prefix>-<YYYYMMDD-HHMMSS>`
//! - Backup: ship the snapshot with restic
//! - Verify: optional `restic check` on a sample of the data
//! - Cleanup: delete snapshots beyond the target's keep count
//!
//! The first three are fatal. A failed backup leaves its snapshot in place
//! so it can be retried by hand. Verify and cleanup only produce warnings.

pub mod report;

pub use report::RunReport;

use crate::clients::{BackupClient, SnapshotLifecycle};
use crate::config::{BackupMode, TargetConfig};
use crate::fs::FileSystem;
use crate::repository::load_repository_env;
use crate::snapshot::{list_snapshots, select_for_deletion, snapshot_name};
use crate::utils::{BackupError, Result, Step};
use chrono::{Local, NaiveDateTime};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tag attached to every restic snapshot made by this tool.
pub const BACKUP_TAG: &str = "btrfs-backup";

/// Share of pack data re-read by each verification run.
pub const VERIFY_DATA_SUBSET: &str = "5%";

/// Result of the retention step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    /// Snapshots removed and confirmed gone
    pub deleted: Vec<String>,
    /// Snapshots that could not be removed
    pub failed: Vec<String>,
}

/// Main backup executor
pub struct BackupExecutor {
    snapshot_dir: PathBuf,
    repo_dir: PathBuf,
    fs: Arc<dyn FileSystem>,
    snapshots: Arc<dyn SnapshotLifecycle>,
    restic: Arc<dyn BackupClient>,
    clock: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl BackupExecutor {
    /// Create an executor over the given snapshot root and repository
    /// credential directory.
    pub fn new(
        snapshot_dir: impl Into<PathBuf>,
        repo_dir: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        snapshots: Arc<dyn SnapshotLifecycle>,
        restic: Arc<dyn BackupClient>,
    ) -> Self {
        Self {
            snapshot_dir: snapshot_dir.into(),
            repo_dir: repo_dir.into(),
            fs,
            snapshots,
            restic,
            clock: local_now,
        }
    }

    /// Replace the wall clock used for snapshot names.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn snapshot_dir(&self) -> &Path {
        &self.snapshot_dir
    }

    /// Run the whole workflow for one target.
    pub async fn run(&self, target_name: &str, target: &TargetConfig) -> Result<RunReport> {
        info!("=== Starting backup for target: {} ===", target_name);
        info!(
            subvolume = %target.subvolume.display(),
            repository = %target.repository,
            mode = %target.mode,
            verify = target.verify,
            keep_snapshots = target.keep_snapshots,
            "Target configuration"
        );

        info!("Validating backup environment");
        self.validate_environment(&target.subvolume)
            .await
            .map_err(|e| BackupError::at(Step::Validate, e))?;

        info!("Creating snapshot with prefix: {}", target.prefix);
        let snapshot = self
            .create_snapshot(&target.subvolume, &target.prefix)
            .await
            .map_err(|e| BackupError::at(Step::Snapshot, e))?;
        info!("Snapshot created: {}", snapshot.display());

        info!(
            "Starting {} backup to repository {}",
            target.mode, target.repository
        );
        if let Err(e) = self.perform_backup(&snapshot, target).await {
            warn!(
                "Backup failed, keeping snapshot for investigation: {}",
                snapshot.display()
            );
            return Err(BackupError::preserving(Step::Backup, &snapshot, e));
        }
        info!("Backup completed");

        let mut report = RunReport {
            target: target_name.to_string(),
            snapshot,
            ..RunReport::default()
        };

        if target.verify {
            info!("Verifying repository integrity: {}", target.repository);
            match self.verify_repository(&target.repository).await {
                Ok(()) => {
                    info!("Repository verification completed");
                    report.verified = Some(true);
                }
                Err(e) => {
                    warn!("Repository verification failed (warning): {}", e);
                    report.verified = Some(false);
                    report.warnings.push(format!("{} failed: {}", Step::Verify, e));
                }
            }
        }

        info!(
            "Cleaning up old snapshots, keeping last {}",
            target.keep_snapshots
        );
        match self
            .cleanup_old_snapshots(&target.prefix, target.keep_snapshots as usize)
            .await
        {
            Ok(summary) => {
                if summary.failed.is_empty() {
                    info!("Snapshot cleanup completed ({} deleted)", summary.deleted.len());
                } else {
                    let warning = format!(
                        "{} failed: failed to delete some snapshots: {}",
                        Step::Cleanup,
                        summary.failed.join(", ")
                    );
                    warn!("{} (warning)", warning);
                    report.warnings.push(warning);
                }
                report.deleted = summary.deleted;
            }
            Err(e) => {
                warn!("Failed to clean up old snapshots (warning): {}", e);
                report.warnings.push(format!("{} failed: {}", Step::Cleanup, e));
            }
        }

        info!("=== Backup for target {} completed ===", target_name);
        Ok(report)
    }

    /// Check that the snapshot root exists and `subvolume` can be snapshotted.
    pub async fn validate_environment(&self, subvolume: &Path) -> Result<()> {
        if !self.fs.exists(&self.snapshot_dir) {
            return Err(BackupError::SnapshotRootMissing(self.snapshot_dir.clone()));
        }
        self.snapshots.validate_source(subvolume).await
    }

    /// Create a read-only snapshot of `subvolume` and return its path.
    ///
    /// Two runs for the same prefix within one second would produce the same
    /// name; the second one fails instead of touching the first snapshot.
    pub async fn create_snapshot(&self, subvolume: &Path, prefix: &str) -> Result<PathBuf> {
        let name = snapshot_name(prefix, (self.clock)());
        let path = self.snapshot_dir.join(&name);

        match self.fs.metadata(&path) {
            Ok(_) => return Err(BackupError::SnapshotExists(path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(BackupError::Inspect { path, source }),
        }

        self.snapshots.create_snapshot(subvolume, &path, true).await?;

        if !self.fs.exists(&path) {
            return Err(BackupError::NotFoundAfterCreation(path));
        }
        Ok(path)
    }

    /// Ship `snapshot` to the target's repository.
    pub async fn perform_backup(&self, snapshot: &Path, target: &TargetConfig) -> Result<()> {
        if !self.fs.exists(snapshot) {
            return Err(BackupError::SnapshotMissing(snapshot.to_path_buf()));
        }

        let env = load_repository_env(self.fs.as_ref(), &self.repo_dir, &target.repository)?;

        let name = snapshot
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tags = vec![BACKUP_TAG.to_string(), target.prefix.clone(), name];
        let force = target.mode == BackupMode::Full;

        debug!(tags = ?tags, force, "Running restic backup");
        self.restic.backup(&env, snapshot, &tags, true, force).await
    }

    /// Check a sample of the repository's data.
    pub async fn verify_repository(&self, repository: &str) -> Result<()> {
        let env = load_repository_env(self.fs.as_ref(), &self.repo_dir, repository)?;
        self.restic.check(&env, VERIFY_DATA_SUBSET).await
    }

    /// Delete every snapshot of `prefix` beyond the `keep` most recent ones.
    ///
    /// All selected snapshots are attempted; failures are collected rather
    /// than stopping the loop. Only a failure to list the snapshot root is
    /// returned as an error.
    pub async fn cleanup_old_snapshots(&self, prefix: &str, keep: usize) -> Result<CleanupSummary> {
        let snapshots = list_snapshots(self.fs.as_ref(), &self.snapshot_dir, prefix)?;
        let mut summary = CleanupSummary::default();

        for entry in select_for_deletion(&snapshots, keep) {
            match self.delete_snapshot(&entry.path).await {
                Ok(()) => {
                    info!("Deleted old snapshot: {}", entry.name);
                    summary.deleted.push(entry.name.clone());
                }
                Err(e) => {
                    warn!("Could not delete snapshot {}: {}", entry.name, e);
                    summary.failed.push(entry.name.clone());
                }
            }
        }

        Ok(summary)
    }

    async fn delete_snapshot(&self, path: &Path) -> Result<()> {
        self.snapshots.delete_snapshot(path).await?;
        if self.fs.exists(path) {
            return Err(BackupError::StillExists(path.to_path_buf()));
        }
        Ok(())
    }
}
