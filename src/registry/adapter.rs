// Fetch/apply contract over a Registry.

use std::sync::Arc;

use super::{Registry, RegistryError};
use crate::model::Registration;

/// Reads a service's current registration and writes it back with new tags.
///
/// The registry only accepts whole-record registration, so `apply` always
/// carries every non-tag field forward from the fetched snapshot.
#[derive(Clone)]
pub struct RegistrationAdapter {
    registry: Arc<dyn Registry>,
}

impl RegistrationAdapter {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self { registry }
    }

    pub async fn fetch(&self, service_id: &str) -> Result<Registration, RegistryError> {
        self.registry
            .get_service(service_id)
            .await?
            .ok_or_else(|| RegistryError::ServiceNotFound(service_id.to_string()))
    }

    pub async fn apply(
        &self,
        registration: &Registration,
        tags: Vec<String>,
    ) -> Result<(), RegistryError> {
        self.registry
            .register_service(&registration.with_tags(tags))
            .await
    }
}
