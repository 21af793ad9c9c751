//! Command execution with combined output capture.

use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

use super::ActionRequest;

/// Error type for spawning an action command.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The configured argv was empty.
    #[error("Action command is empty")]
    EmptyCommand,
    /// The program was not found.
    #[error("Command not found: {0}")]
    NotFound(String),
    /// Permission denied when spawning.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpawnError {
    /// Classify an I/O error from a spawn attempt.
    fn from_io(program: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(program.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(program.to_string()),
            _ => Self::Io(err),
        }
    }
}

/// Captured result of one action command.
#[derive(Debug)]
pub struct CommandOutput {
    /// Exit status of the process.
    pub status: ExitStatus,
    /// Captured stdout followed by captured stderr.
    pub combined: Vec<u8>,
}

impl CommandOutput {
    /// Whether the command exited successfully.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Run one action to completion, capturing stdout and stderr into a single
/// buffer.
///
/// Blocks for the full process lifetime; there is no timeout. A non-zero
/// exit is reported through [`CommandOutput::status`], not as an error.
///
/// # Errors
///
/// Returns an error only when the process cannot be spawned at all.
pub async fn run_command(request: &ActionRequest) -> Result<CommandOutput, SpawnError> {
    let (program, args) = request.argv.split_first().ok_or(SpawnError::EmptyCommand)?;

    let output = Command::new(program)
        .args(args)
        .current_dir(&request.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| SpawnError::from_io(program, e))?;

    let mut combined = output.stdout;
    combined.extend_from_slice(&output.stderr);

    Ok(CommandOutput {
        status: output.status,
        combined,
    })
}
