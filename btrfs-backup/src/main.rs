//! btrfs-backup - Main entry point
//!
//! Snapshot a btrfs subvolume, back it up with restic, prune old snapshots.

use anyhow::{anyhow, bail, Result};
use btrfs_backup::clients::{BtrfsClient, ResticClient};
use btrfs_backup::config::{self, Config, TargetConfig};
use btrfs_backup::fs::LocalFs;
use btrfs_backup::shutdown::ShutdownListener;
use btrfs_backup::{utils, BackupExecutor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: $BTRFSBACKUP_CONFIG or
    /// ~/.config/btrfs-backup/config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error), overrides --verbose
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Snapshot a target, back it up and prune old snapshots
    Backup {
        /// Target name, looked up in the configured target directory
        target: String,

        /// Path to the target configuration file
        #[arg(short, long, value_name = "FILE")]
        target_config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // BackupError messages already embed their causes
            tracing::error!("{}", e);
            eprintln!("Backup failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config_path = config::resolve_config_path(args.config.as_deref())?;
    let config = Config::from_file(&config_path)
        .map_err(|e| anyhow!("Error loading configuration: {}", e))?;

    // Initialize logging
    let log_level = match (&args.log_level, args.verbose) {
        (Some(level), _) => level.as_str(),
        (None, true) => "debug",
        (None, false) => config.log_level.as_str(),
    };
    utils::logger::init(log_level)?;

    tracing::info!("btrfs-backup v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Using config file: {}", config_path.display());

    match args.command {
        Command::Backup {
            target,
            target_config,
        } => backup(&config, &target, target_config).await,
    }
}

async fn backup(config: &Config, target_name: &str, target_config: Option<PathBuf>) -> Result<()> {
    let target_path =
        config::resolve_target_path(target_config.as_deref(), &config.target_dir, target_name)?;
    tracing::debug!("Using target config file: {}", target_path.display());

    let target = TargetConfig::from_file(&target_path)
        .map_err(|e| anyhow!("Error loading target configuration: {}", e))?;

    let executor = BackupExecutor::new(
        &config.snapshot_dir,
        &config.restic_repo_dir,
        Arc::new(LocalFs),
        Arc::new(BtrfsClient::new(&config.btrfs_bin, config.btrfs_needs_sudo())),
        Arc::new(ResticClient::new(&config.restic_bin)),
    );

    let mut shutdown = ShutdownListener::install()?;

    tokio::select! {
        result = executor.run(target_name, &target) => {
            let report = result?;
            if report.has_warnings() {
                println!(
                    "Backup completed with {} warning(s): {}",
                    report.warnings.len(),
                    report.snapshot.display()
                );
            } else {
                println!("Backup completed successfully: {}", report.snapshot.display());
            }
            Ok(())
        }
        signal = shutdown.recv() => {
            tracing::warn!(
                "Run for target {} abandoned; check {} for a snapshot left behind",
                target_name,
                executor.snapshot_dir().display()
            );
            bail!("interrupted by {}", signal)
        }
    }
}
