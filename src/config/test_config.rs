use super::{Config, Consul, Logs, Service, TagitBox};
use std::time::Duration;

/// Creates a new test configuration.
pub fn new_test_config() -> Config {
    Config {
        tagit: TagitBox {
            env: super::DEV.to_string(),
            logs: Logs {
                level: "debug".to_string(),
            },
            consul: Consul {
                addr: "127.0.0.1:8500".to_string(),
                token: None,
                timeout: Duration::from_secs(5),
            },
            service: Service {
                id: "test-service".to_string(),
                script: "/bin/echo primary".to_string(),
                tag_prefix: "test".to_string(),
                interval: Duration::from_secs(1),
                script_timeout: Duration::from_secs(5),
            },
        },
    }
}
