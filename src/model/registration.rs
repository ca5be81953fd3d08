// Snapshot of one service registration.

use std::collections::BTreeMap;

/// Relative DNS/load-balancing weights of a service by health state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Weights {
    pub passing: i32,
    pub warning: i32,
}

/// A service registration as the registry reports it.
///
/// Fetched once per reconciliation pass and never cached across passes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Registration {
    pub id: String,
    pub name: String,
    pub address: String,
    pub port: u16,
    pub kind: String,
    pub tags: Vec<String>,
    pub meta: BTreeMap<String, String>,
    pub weights: Option<Weights>,
}

impl Registration {
    /// Copies every field and replaces the tags.
    pub fn with_tags(&self, tags: Vec<String>) -> Self {
        Self {
            tags,
            ..self.clone()
        }
    }
}
