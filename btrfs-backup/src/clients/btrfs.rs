//! Snapshot lifecycle through the `btrfs` command line tool.

use super::command::CommandLine;
use crate::utils::{BackupError, Result};
use async_trait::async_trait;
use std::path::Path;

/// Create, inspect and delete copy-on-write snapshots.
#[async_trait]
pub trait SnapshotLifecycle: Send + Sync {
    /// Confirm `path` can be snapshotted.
    async fn validate_source(&self, path: &Path) -> Result<()>;

    /// Create a point-in-time copy of `source` at `destination`.
    async fn create_snapshot(&self, source: &Path, destination: &Path, readonly: bool) -> Result<()>;

    /// Irreversibly remove the snapshot at `path`.
    async fn delete_snapshot(&self, path: &Path) -> Result<()>;
}

/// Production client running `btrfs subvolume ...`, usually through `sudo`.
#[derive(Debug, Clone)]
pub struct BtrfsClient {
    bin: String,
    use_sudo: bool,
}

impl BtrfsClient {
    pub fn new(bin: impl Into<String>, use_sudo: bool) -> Self {
        Self {
            bin: bin.into(),
            use_sudo,
        }
    }

    fn subvolume(&self, action: &str) -> CommandLine {
        CommandLine::new(&self.bin)
            .sudo(self.use_sudo)
            .arg("subvolume")
            .arg(action)
    }

    pub(crate) fn show_command(&self, path: &Path) -> CommandLine {
        self.subvolume("show").arg(path)
    }

    pub(crate) fn snapshot_command(&self, source: &Path, destination: &Path, readonly: bool) -> CommandLine {
        let mut line = self.subvolume("snapshot");
        if readonly {
            line = line.arg("-r");
        }
        line.arg(source).arg(destination)
    }

    pub(crate) fn delete_command(&self, path: &Path) -> CommandLine {
        self.subvolume("delete").arg(path)
    }
}

impl Default for BtrfsClient {
    fn default() -> Self {
        Self::new("btrfs", true)
    }
}

#[async_trait]
impl SnapshotLifecycle for BtrfsClient {
    async fn validate_source(&self, path: &Path) -> Result<()> {
        self.show_command(path)
            .run(None)
            .await
            .map_err(|source| BackupError::InvalidSource {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn create_snapshot(&self, source: &Path, destination: &Path, readonly: bool) -> Result<()> {
        self.snapshot_command(source, destination, readonly)
            .run(None)
            .await
            .map_err(|e| BackupError::CreationFailed {
                path: destination.to_path_buf(),
                source: e,
            })
    }

    async fn delete_snapshot(&self, path: &Path) -> Result<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.delete_command(path)
            .run(None)
            .await
            .map_err(|source| BackupError::DeletionFailed { name, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn argv(line: CommandLine) -> Vec<String> {
        line.argv()
            .into_iter()
            .map(|a: OsString| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_snapshot_command_is_readonly() {
        let client = BtrfsClient::default();
        let line = client.snapshot_command(
            Path::new("/mnt/data"),
            Path::new("/snapshots/data-20240101-120000"),
            true,
        );

        assert_eq!(
            argv(line),
            vec![
                "sudo",
                "btrfs",
                "subvolume",
                "snapshot",
                "-r",
                "/mnt/data",
                "/snapshots/data-20240101-120000"
            ]
        );
    }

    #[test]
    fn test_commands_without_sudo() {
        let client = BtrfsClient::new("/usr/bin/btrfs", false);

        assert_eq!(
            argv(client.show_command(Path::new("/mnt/data"))),
            vec!["/usr/bin/btrfs", "subvolume", "show", "/mnt/data"]
        );
        assert_eq!(
            argv(client.delete_command(Path::new("/snapshots/old"))),
            vec!["/usr/bin/btrfs", "subvolume", "delete", "/snapshots/old"]
        );
        assert_eq!(
            argv(client.snapshot_command(Path::new("/a"), Path::new("/b"), false)),
            vec!["/usr/bin/btrfs", "subvolume", "snapshot", "/a", "/b"]
        );
    }

    #[tokio::test]
    async fn test_failed_show_is_invalid_source() {
        // `false` ignores its arguments and exits 1
        let client = BtrfsClient::new("false", false);

        let err = client.validate_source(Path::new("/mnt/data")).await.unwrap_err();
        assert!(matches!(err, BackupError::InvalidSource { .. }));

        let err = client
            .delete_snapshot(Path::new("/snapshots/data-1"))
            .await
            .unwrap_err();
        match err {
            BackupError::DeletionFailed { name, .. } => assert_eq!(name, "data-1"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
