//! External command execution.
//!
//! Package managers are reached through [`CommandRunner`] so the fix
//! pipeline can be driven without touching the network.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` inside `cwd`, succeeding only on a zero
    /// exit status.
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<(), CommandError>;
}

/// Runs commands as child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<(), CommandError> {
        debug!(program, ?args, cwd = %cwd.display(), "Running command");

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(CommandError::Failed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// A command seen by [`RecordingCommandRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl RecordedCommand {
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Records commands instead of running them.
///
/// Every call succeeds unless the runner was built with [`failing`].
///
/// [`failing`]: RecordingCommandRunner::failing
#[derive(Debug, Default)]
pub struct RecordingCommandRunner {
    commands: Mutex<Vec<RecordedCommand>>,
    fail: bool,
}

impl RecordingCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.commands
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CommandRunner for RecordingCommandRunner {
    async fn run(&self, program: &str, args: &[String], _cwd: &Path) -> Result<(), CommandError> {
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(RecordedCommand {
                program: program.to_string(),
                args: args.to_vec(),
            });
        }

        if self.fail {
            Err(CommandError::Failed {
                program: program.to_string(),
                status: "exit status: 1".to_string(),
                stderr: "simulated failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}
