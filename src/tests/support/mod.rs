// Shared test support code.
// In-memory collaborators for the driver plus a fake Consul agent over HTTP.

pub mod agent;
pub mod common;
pub mod executor;
pub mod registry;

pub use agent::FakeAgent;
pub use common::*;
pub use executor::ScriptedExecutor;
pub use registry::FakeRegistry;
