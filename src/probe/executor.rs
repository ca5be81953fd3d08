// Process-backed probe executor.

use bytes::Bytes;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::error::{ExecError, ExitStatusError};
use super::CommandExecutor;

/// Default bound on a single probe run.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the probe as a child process without a shell.
///
/// The command line is split with shell word rules; the first word is the
/// program. The child is killed when the timeout elapses.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    timeout: Duration,
}

impl ProcessExecutor {
    pub fn new(timeout: Duration) -> Self {
        let timeout = if timeout.is_zero() {
            DEFAULT_SCRIPT_TIMEOUT
        } else {
            timeout
        };
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT_TIMEOUT)
    }
}

/// Splits a command line into program and arguments.
pub fn split_command(command: &str) -> Result<(String, Vec<String>), ExecError> {
    if command.trim().is_empty() {
        return Err(ExecError::InvalidCommand("empty command".to_string()));
    }
    let mut words = shlex::split(command)
        .ok_or_else(|| ExecError::InvalidCommand(format!("cannot split {:?}", command)))?
        .into_iter();
    let program = words
        .next()
        .ok_or_else(|| ExecError::InvalidCommand("no program after splitting".to_string()))?;
    Ok((program, words.collect()))
}

#[async_trait::async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn execute(&self, command: &str) -> Result<Bytes, ExecError> {
        let (program, args) = split_command(command)?;

        let child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ExecError::execution_failed)?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(ExecError::execution_failed)?,
            Err(_) => return Err(ExecError::Timeout(self.timeout)),
        };

        if !output.status.success() {
            return Err(ExecError::execution_failed(ExitStatusError {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }));
        }

        debug!(
            component = "probe",
            event = "probe_finished",
            program = %program,
            stdout_len = output.stdout.len(),
            "probe finished"
        );

        Ok(Bytes::from(output.stdout))
    }
}
