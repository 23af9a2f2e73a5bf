//! Backup and repository checks through the `restic` binary.

use super::command::CommandLine;
use crate::repository::RepositoryEnv;
use crate::utils::{BackupError, Result};
use async_trait::async_trait;
use std::path::Path;

/// Ship data to a repository and check its integrity.
#[async_trait]
pub trait BackupClient: Send + Sync {
    /// Back up `source`. `force` re-reads every file instead of relying on
    /// the parent snapshot.
    async fn backup(
        &self,
        env: &RepositoryEnv,
        source: &Path,
        tags: &[String],
        exclude_caches: bool,
        force: bool,
    ) -> Result<()>;

    /// Check repository consistency, re-reading `read_data_subset` of the
    /// pack data (e.g. `5%`). An empty subset checks metadata only.
    async fn check(&self, env: &RepositoryEnv, read_data_subset: &str) -> Result<()>;
}

/// Production client for the restic executable.
#[derive(Debug, Clone)]
pub struct ResticClient {
    bin: String,
}

impl ResticClient {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    pub(crate) fn backup_command(
        &self,
        source: &Path,
        tags: &[String],
        exclude_caches: bool,
        force: bool,
    ) -> CommandLine {
        let mut line = CommandLine::new(&self.bin).arg("backup").arg(source);
        for tag in tags {
            line = line.arg("--tag").arg(tag);
        }
        if exclude_caches {
            line = line.arg("--exclude-caches");
        }
        if force {
            line = line.arg("--force");
        }
        line
    }

    pub(crate) fn check_command(&self, read_data_subset: &str) -> CommandLine {
        let line = CommandLine::new(&self.bin).arg("check");
        if read_data_subset.is_empty() {
            line
        } else {
            line.arg(format!("--read-data-subset={}", read_data_subset))
        }
    }

    fn repository_label(env: &RepositoryEnv) -> String {
        env.get("RESTIC_REPOSITORY")
            .unwrap_or("<unknown repository>")
            .to_string()
    }
}

impl Default for ResticClient {
    fn default() -> Self {
        Self::new("restic")
    }
}

#[async_trait]
impl BackupClient for ResticClient {
    async fn backup(
        &self,
        env: &RepositoryEnv,
        source: &Path,
        tags: &[String],
        exclude_caches: bool,
        force: bool,
    ) -> Result<()> {
        self.backup_command(source, tags, exclude_caches, force)
            .run(Some(env))
            .await
            .map_err(BackupError::BackupFailed)
    }

    async fn check(&self, env: &RepositoryEnv, read_data_subset: &str) -> Result<()> {
        self.check_command(read_data_subset)
            .run(Some(env))
            .await
            .map_err(|source| BackupError::VerificationFailed {
                repository: Self::repository_label(env),
                source,
            })
    }
}
