//! Service registry access.
//!
//! [`Registry`] is the narrow capability the reconciler needs: read one
//! registration and write one back. [`RegistrationAdapter`] layers the
//! fetch/apply contract on top of it and [`ConsulRegistry`] implements it
//! against a Consul agent.

use crate::model::Registration;

pub mod adapter;
pub mod consul;
mod wire;


pub use adapter::RegistrationAdapter;
pub use consul::{ConsulRegistry, RegistryConfig, DEFAULT_REGISTRY_ADDR, DEFAULT_REQUEST_TIMEOUT};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("service {0} not found")]
    ServiceNotFound(String),
    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

impl RegistryError {
    pub fn unavailable(cause: impl std::fmt::Display) -> Self {
        RegistryError::Unavailable(cause.to_string())
    }
}

/// Service registry capability.
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Returns the registration for `id`, or `None` when the registry has no such service.
    async fn get_service(&self, id: &str) -> Result<Option<Registration>, RegistryError>;

    /// Replaces the whole registration.
    async fn register_service(&self, registration: &Registration) -> Result<(), RegistryError>;
}
