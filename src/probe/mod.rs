//! Probe execution: runs the external command whose output drives the tags.

use bytes::Bytes;

pub mod error;
pub mod executor;


pub use error::{ExecError, ExitStatusError};
pub use executor::{split_command, ProcessExecutor, DEFAULT_SCRIPT_TIMEOUT};

/// Command executor capability.
#[async_trait::async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Runs `command` once and returns its standard output.
    async fn execute(&self, command: &str) -> Result<Bytes, ExecError>;
}
