// Error definitions for a reconciliation pass.

use crate::probe::ExecError;
use crate::registry::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum PassError {
    #[error("error running probe: {0}")]
    Probe(#[from] ExecError),
    #[error("error talking to registry: {0}")]
    Registry(#[from] RegistryError),
}

impl PassError {
    /// Short stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PassError::Probe(ExecError::InvalidCommand(_)) => "invalid_command",
            PassError::Probe(ExecError::Timeout(_)) => "timeout",
            PassError::Probe(ExecError::ExecutionFailed(_)) => "execution_failed",
            PassError::Registry(RegistryError::ServiceNotFound(_)) => "service_not_found",
            PassError::Registry(RegistryError::Unavailable(_)) => "registry_unavailable",
        }
    }
}
