//! Adapters for the two external tools the engine drives.
//!
//! The orchestrator only sees the [`SnapshotLifecycle`] and [`BackupClient`]
//! traits; the production implementations shell out to `btrfs` and `restic`.

pub mod btrfs;
pub mod command;
pub mod restic;

pub use btrfs::{BtrfsClient, SnapshotLifecycle};
pub use restic::{BackupClient, ResticClient};
