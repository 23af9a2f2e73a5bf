//! Snapshot inventory: what is currently on disk for a prefix.

use super::{name_filter, SnapshotEntry};
use crate::fs::FileSystem;
use crate::utils::{BackupError, Result};
use std::path::Path;
use tracing::debug;

/// List the snapshots of `prefix` under `root`, most recent first.
///
/// A missing root yields an empty list; a fresh system has no snapshots yet.
/// Entries whose metadata cannot be read are skipped. Equal modification
/// times keep directory-listing order.
pub fn list_snapshots(fs: &dyn FileSystem, root: &Path, prefix: &str) -> Result<Vec<SnapshotEntry>> {
    if !fs.exists(root) {
        return Ok(Vec::new());
    }

    let names = fs.read_dir(root).map_err(|source| BackupError::List {
        path: root.to_path_buf(),
        source,
    })?;

    let filter = name_filter(prefix);
    let mut snapshots = Vec::new();

    for name in names.into_iter().filter(|name| name.starts_with(&filter)) {
        let path = root.join(&name);
        match fs.metadata(&path) {
            Ok(metadata) => snapshots.push(SnapshotEntry {
                name,
                path,
                modified: metadata.modified,
            }),
            Err(e) => debug!("Skipping {}: {}", path.display(), e),
        }
    }

    snapshots.sort_by(|a, b| b.modified.cmp(&a.modified));
    Ok(snapshots)
}
