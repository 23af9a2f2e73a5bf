//! Local snapshots: naming, inventory and retention.
//!
//! Snapshots live directly under the snapshot root and are named
//! `<prefix>-<YYYYMMDD-HHMMSS>`. Other tooling reads these names, so the
//! format must not change.

pub mod inventory;
pub mod retention;

pub use inventory::list_snapshots;
pub use retention::select_for_deletion;

use chrono::NaiveDateTime;
use std::path::PathBuf;
use std::time::SystemTime;

/// chrono format of the timestamp part of a snapshot name.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// A snapshot found in the snapshot root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    /// Directory name, `<prefix>-<timestamp>`
    pub name: String,

    /// Full path inside the snapshot root
    pub path: PathBuf,

    /// Last modified time, used as the recency signal
    pub modified: SystemTime,
}

/// Name for a snapshot of `prefix` taken at `taken_at`.
pub fn snapshot_name(prefix: &str, taken_at: NaiveDateTime) -> String {
    format!("{}-{}", prefix, taken_at.format(TIMESTAMP_FORMAT))
}

/// Prefix, including the separator, shared by all snapshots of `prefix`.
pub(crate) fn name_filter(prefix: &str) -> String {
    format!("{}-", prefix)
}
