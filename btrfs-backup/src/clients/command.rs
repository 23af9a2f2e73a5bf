//! Subprocess launching shared by the btrfs and restic adapters.

use crate::repository::RepositoryEnv;
use crate::utils::CommandError;
use std::ffi::OsString;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// A single external command line.
#[derive(Debug, Clone)]
pub struct CommandLine {
    program: String,
    args: Vec<OsString>,
    sudo: bool,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            sudo: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Run through `sudo`.
    pub fn sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    /// Full argv, including a leading `sudo` when requested.
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        if self.sudo {
            argv.push(OsString::from("sudo"));
        }
        argv.push(OsString::from(&self.program));
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Run to completion. stdout is passed through, stderr is captured for
    /// the error message.
    ///
    /// `env` is layered over the inherited environment of the child only.
    pub async fn run(&self, env: Option<&RepositoryEnv>) -> Result<(), CommandError> {
        let argv = self.argv();
        debug!(argv = ?argv, "Running command");

        let mut command = Command::new(&argv[0]);
        command
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());
        if let Some(env) = env {
            command.envs(env.iter());
        }

        let output = command.output().await.map_err(|source| CommandError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if output.status.success() {
            return Ok(());
        }

        Err(CommandError::Exit {
            program: self.program.clone(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
