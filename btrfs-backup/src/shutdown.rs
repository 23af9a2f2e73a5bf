//! SIGINT/SIGTERM handling for an in-flight run.
//!
//! The run is abandoned when a signal arrives, but child processes are left
//! alone: interrupting `btrfs subvolume snapshot` or `restic backup` halfway
//! is worse than letting it finish on its own.

use std::fmt;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::info;

/// Signal that ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => f.write_str("SIGINT"),
            ShutdownSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Installed signal handlers
pub struct ShutdownListener {
    interrupt: Signal,
    terminate: Signal,
}

impl ShutdownListener {
    /// Install handlers. Must be called before the work it guards starts.
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for SIGINT or SIGTERM
    pub async fn recv(&mut self) -> ShutdownSignal {
        let received = tokio::select! {
            _ = self.interrupt.recv() => ShutdownSignal::Interrupt,
            _ = self.terminate.recv() => ShutdownSignal::Terminate,
        };
        info!("Received {}, initiating shutdown", received);
        received
    }
}
