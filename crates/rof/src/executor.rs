//! Command execution.
//!
//! The command line is handed to a shell as one string with the terminal's
//! stdin, stdout and stderr passed straight through.

use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Errors from running the user's command.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The shell could not be started or waited on.
    #[error("failed to run command: {0}")]
    SpawnFailed(#[from] std::io::Error),
}

/// Runs a command line and reports its exit code.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command_line` in `workdir` and wait for it to finish.
    ///
    /// `Ok` carries the command's exit code, whatever its value. `Err` means
    /// the command never ran to completion.
    async fn run(&self, command_line: &str, workdir: &Path) -> Result<i32, ExecError>;
}

/// Executor that runs commands through `<shell> -c`.
pub struct ShellExecutor {
    shell: String,
}

impl ShellExecutor {
    /// Create an executor for the given shell.
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn run(&self, command_line: &str, workdir: &Path) -> Result<i32, ExecError> {
        debug!(shell = %self.shell, command = %command_line, "Executing command");

        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(command_line)
            .current_dir(workdir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;

        Ok(exit_code(status))
    }
}

/// Exit code for a finished process.
///
/// A process killed by a signal reports `128 + signal`, like a shell does.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
