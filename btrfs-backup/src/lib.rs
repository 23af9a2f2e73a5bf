//! btrfs-backup library
//!
//! Takes read-only btrfs snapshots, ships them to restic repositories and
//! prunes old snapshots locally.

pub mod clients;
pub mod config;
pub mod executor;
pub mod fs;
pub mod repository;
pub mod shutdown;
pub mod snapshot;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, TargetConfig};
pub use executor::{BackupExecutor, RunReport};
pub use utils::errors::BackupError;
pub type Result<T> = std::result::Result<T, BackupError>;
