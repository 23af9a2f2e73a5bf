//! Custom error types for the backup engine.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Workflow phase a fatal error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Validate,
    Snapshot,
    Backup,
    Verify,
    Cleanup,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Validate => "environment validation",
            Step::Snapshot => "snapshot creation",
            Step::Backup => "backup operation",
            Step::Verify => "repository verification",
            Step::Cleanup => "snapshot cleanup",
        };
        f.write_str(name)
    }
}

/// Failure of an external program.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} {}{}", exit_description(.code), stderr_suffix(.stderr))]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

fn preserved_suffix(snapshot: &Option<PathBuf>) -> String {
    match snapshot {
        Some(path) => format!(" (snapshot preserved at {})", path.display()),
        None => String::new(),
    }
}

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("snapshots directory does not exist: {}", .0.display())]
    SnapshotRootMissing(PathBuf),

    #[error("source subvolume invalid or not BTRFS: {}", .path.display())]
    InvalidSource {
        path: PathBuf,
        #[source]
        source: CommandError,
    },

    #[error("BTRFS snapshot command failed: {source}")]
    CreationFailed {
        path: PathBuf,
        #[source]
        source: CommandError,
    },

    #[error("snapshot already exists, refusing to overwrite: {}", .0.display())]
    SnapshotExists(PathBuf),

    #[error("cannot inspect snapshot destination {}: {source}", .path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot not found after creation: {}", .0.display())]
    NotFoundAfterCreation(PathBuf),

    #[error("snapshot path does not exist: {}", .0.display())]
    SnapshotMissing(PathBuf),

    #[error("repository configuration '{repository}' not found: {}", .path.display())]
    RepositoryNotFound { repository: String, path: PathBuf },

    #[error("failed to read repository config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("restic backup command failed: {0}")]
    BackupFailed(#[source] CommandError),

    #[error("repository verification failed: {repository}: {source}")]
    VerificationFailed {
        repository: String,
        #[source]
        source: CommandError,
    },

    #[error("could not list snapshots directory {}: {source}", .path.display())]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("BTRFS delete command failed for snapshot {name}: {source}")]
    DeletionFailed {
        name: String,
        #[source]
        source: CommandError,
    },

    #[error("snapshot still exists after deletion: {}", .0.display())]
    StillExists(PathBuf),

    #[error("{step} failed{}: {source}", preserved_suffix(.snapshot))]
    Step {
        step: Step,
        snapshot: Option<PathBuf>,
        #[source]
        source: Box<BackupError>,
    },
}

impl BackupError {
    /// Attribute an error to a workflow step.
    pub fn at(step: Step, source: BackupError) -> Self {
        BackupError::Step {
            step,
            snapshot: None,
            source: Box::new(source),
        }
    }

    /// Attribute an error to a workflow step that left a snapshot behind.
    pub fn preserving(step: Step, snapshot: &Path, source: BackupError) -> Self {
        BackupError::Step {
            step,
            snapshot: Some(snapshot.to_path_buf()),
            source: Box::new(source),
        }
    }

    /// The failed step, if this error was raised by the workflow.
    pub fn step(&self) -> Option<Step> {
        match self {
            BackupError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Snapshot left in place by a failed run.
    pub fn preserved_snapshot(&self) -> Option<&Path> {
        match self {
            BackupError::Step { snapshot, .. } => snapshot.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
