//! Configuration management for btrfs-backup.
//!
//! The main configuration is a TOML file with `BTRFSBACKUP_*` environment
//! variable overrides. Each backup target lives in its own TOML file inside
//! `target_dir`.
//!
//! ```toml
//! # config.toml
//! target_dir = "/etc/btrfs-backup/targets"
//! snapshot_dir = "/.snapshots"
//! restic_repo_dir = "/etc/btrfs-backup/repos"
//! ```
//!
//! ```toml
//! # targets/home
//! subvolume = "/home"
//! prefix = "home"
//! repository = "offsite"
//! type = "incremental"
//! verify = true
//! keep_snapshots = 5
//! ```

use crate::utils::{BackupError, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable pointing at the main configuration file.
pub const CONFIG_ENV: &str = "BTRFSBACKUP_CONFIG";

/// Prefix of environment variables overriding main configuration keys.
pub const ENV_PREFIX: &str = "BTRFSBACKUP";

/// Snapshots kept when a target does not say otherwise.
pub const DEFAULT_KEEP_SNAPSHOTS: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory containing target configuration files
    pub target_dir: PathBuf,

    /// Directory where snapshots are created
    pub snapshot_dir: PathBuf,

    /// Directory containing repository credential files
    pub restic_repo_dir: PathBuf,

    /// restic executable
    #[serde(default = "default_restic_bin")]
    pub restic_bin: String,

    /// btrfs executable
    #[serde(default = "default_btrfs_bin")]
    pub btrfs_bin: String,

    /// Run btrfs through sudo. Unset means "only when not already root".
    #[serde(default)]
    pub use_sudo: Option<bool>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// How restic should treat unchanged files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupMode {
    /// Rely on restic's deduplication against the parent snapshot
    #[default]
    Incremental,
    /// Re-read everything (`restic backup --force`)
    Full,
}

impl fmt::Display for BackupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupMode::Incremental => f.write_str("incremental"),
            BackupMode::Full => f.write_str("full"),
        }
    }
}

/// One backup target: which subvolume goes to which repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Subvolume to snapshot
    pub subvolume: PathBuf,

    /// Snapshot name prefix, also used for retention
    pub prefix: String,

    /// Name of the credential file in `restic_repo_dir`
    pub repository: String,

    #[serde(rename = "type", default)]
    pub mode: BackupMode,

    /// Run `restic check` after the backup
    #[serde(default)]
    pub verify: bool,

    /// Local snapshots to retain; 0 or unset means the default of 3
    #[serde(default)]
    pub keep_snapshots: u32,
}

fn default_restic_bin() -> String {
    "restic".to_string()
}

fn default_btrfs_bin() -> String {
    "btrfs".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load the main configuration from a TOML file, applying
    /// `BTRFSBACKUP_*` environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(BackupError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|e| BackupError::Config(format!("failed to read {}: {}", path.display(), e)))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| BackupError::Config(format!("invalid {}: {}", path.display(), e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("target_dir", &self.target_dir),
            ("snapshot_dir", &self.snapshot_dir),
            ("restic_repo_dir", &self.restic_repo_dir),
        ] {
            if value.as_os_str().is_empty() {
                return Err(BackupError::Config(format!("{} is required", key)));
            }
        }
        if self.restic_bin.is_empty() {
            return Err(BackupError::Config("restic_bin is required".to_string()));
        }
        if self.btrfs_bin.is_empty() {
            return Err(BackupError::Config("btrfs_bin is required".to_string()));
        }
        Ok(())
    }

    /// Whether btrfs commands need a `sudo` prefix.
    pub fn btrfs_needs_sudo(&self) -> bool {
        self.use_sudo
            .unwrap_or_else(|| !nix::unistd::geteuid().is_root())
    }
}

impl TargetConfig {
    /// Load, default and validate a target file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BackupError::Config(format!(
                "failed to read target config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut target: TargetConfig = toml::from_str(content)
            .map_err(|e| BackupError::Config(format!("invalid target configuration: {}", e)))?;
        target.apply_defaults();
        target.validate()?;
        Ok(target)
    }

    fn apply_defaults(&mut self) {
        if self.keep_snapshots == 0 {
            self.keep_snapshots = DEFAULT_KEEP_SNAPSHOTS;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.subvolume.as_os_str().is_empty() {
            return Err(BackupError::Config("subvolume is required".to_string()));
        }
        if self.prefix.is_empty() {
            return Err(BackupError::Config("prefix is required".to_string()));
        }
        if self.repository.is_empty() {
            return Err(BackupError::Config("repository is required".to_string()));
        }
        Ok(())
    }
}

/// `$XDG_CONFIG_HOME/btrfs-backup`, usually `~/.config/btrfs-backup`.
fn default_config_home() -> Result<PathBuf> {
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("btrfs-backup"))
        .ok_or_else(|| BackupError::Config("could not determine home directory".to_string()))
}

/// Main configuration path: explicit flag, then `BTRFSBACKUP_CONFIG`, then
/// the per-user default.
pub fn resolve_config_path(provided: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = provided {
        return Ok(path.to_path_buf());
    }
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Ok(default_config_home()?.join("config.toml")),
    }
}

/// Target configuration path: explicit flag, then `target_dir/<target>`.
pub fn resolve_target_path(provided: Option<&Path>, target_dir: &Path, target: &str) -> Result<PathBuf> {
    if let Some(path) = provided {
        return Ok(path.to_path_buf());
    }
    if !target_dir.as_os_str().is_empty() {
        return Ok(target_dir.join(target));
    }
    Ok(default_config_home()?.join("targets").join(target))
}
