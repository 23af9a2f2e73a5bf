//! Outcome of a successful run.

use std::path::PathBuf;

/// What a run did once the backup itself succeeded.
///
/// Verification and cleanup problems never fail a run; they end up in
/// `warnings` instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub target: String,

    /// Snapshot created and shipped by this run
    pub snapshot: PathBuf,

    /// `None` when verification is disabled for the target
    pub verified: Option<bool>,

    /// Names of old snapshots removed by retention
    pub deleted: Vec<String>,

    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
