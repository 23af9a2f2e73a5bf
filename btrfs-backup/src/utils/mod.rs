//! Utility modules for the backup engine.

pub mod errors;
pub mod logger;

pub use errors::{BackupError, CommandError, Result, Step};
