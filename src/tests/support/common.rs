// Common test utilities.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::model::{Registration, Weights};

/// Owned strings from literals.
pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// A fully populated registration, so tests can check nothing but tags changes.
pub fn registration(id: &str, tags: &[&str]) -> Registration {
    Registration {
        id: id.to_string(),
        name: format!("{}-svc", id),
        address: "10.0.0.42".to_string(),
        port: 8080,
        kind: String::new(),
        tags: strings(tags),
        meta: BTreeMap::from([
            ("version".to_string(), "1.0.0".to_string()),
            ("owner".to_string(), "platform".to_string()),
        ]),
        weights: Some(Weights {
            passing: 10,
            warning: 1,
        }),
    }
}

/// Polls `check` until it returns true or `limit` elapses.
pub async fn eventually<F>(limit: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
