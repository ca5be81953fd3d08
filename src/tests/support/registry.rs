// In-memory registry fake.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::model::Registration;
use crate::registry::{Registry, RegistryError};

/// Stores registrations by ID and records every write.
#[derive(Default)]
pub struct FakeRegistry {
    services: Mutex<HashMap<String, Registration>>,
    writes: Mutex<Vec<Registration>>,
    get_calls: AtomicUsize,
    fail_get: Mutex<Option<String>>,
    fail_register: Mutex<Option<String>>,
}

impl FakeRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_service(registration: Registration) -> Arc<Self> {
        let registry = Self::new();
        registry.put(registration);
        registry
    }

    pub fn put(&self, registration: Registration) {
        self.services
            .lock()
            .insert(registration.id.clone(), registration);
    }

    pub fn service(&self, id: &str) -> Option<Registration> {
        self.services.lock().get(id).cloned()
    }

    pub fn writes(&self) -> Vec<Registration> {
        self.writes.lock().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Makes `get_service` fail with `Unavailable` until cleared with `None`.
    pub fn fail_get(&self, reason: Option<&str>) {
        *self.fail_get.lock() = reason.map(str::to_string);
    }

    /// Makes `register_service` fail with `Unavailable` until cleared with `None`.
    pub fn fail_register(&self, reason: Option<&str>) {
        *self.fail_register.lock() = reason.map(str::to_string);
    }
}

#[async_trait::async_trait]
impl Registry for FakeRegistry {
    async fn get_service(&self, id: &str) -> Result<Option<Registration>, RegistryError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.fail_get.lock().clone() {
            return Err(RegistryError::Unavailable(reason));
        }
        Ok(self.service(id))
    }

    async fn register_service(&self, registration: &Registration) -> Result<(), RegistryError> {
        if let Some(reason) = self.fail_register.lock().clone() {
            return Err(RegistryError::Unavailable(reason));
        }
        self.writes.lock().push(registration.clone());
        self.put(registration.clone());
        Ok(())
    }
}
