// Error definitions for probe execution.

use std::process::ExitStatus;
use std::time::Duration;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("invalid probe command: {0}")]
    InvalidCommand(String),
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("probe execution failed: {0}")]
    ExecutionFailed(#[source] BoxError),
}

impl ExecError {
    pub fn execution_failed(cause: impl Into<BoxError>) -> Self {
        ExecError::ExecutionFailed(cause.into())
    }
}

/// The probe ran to completion but exited unsuccessfully.
#[derive(Debug, thiserror::Error)]
#[error("{status}{}", stderr_suffix(.stderr))]
pub struct ExitStatusError {
    pub status: ExitStatus,
    pub stderr: String,
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}
