//! Hyper HTTP client used to talk to the registry agent.

mod hyper_client;

pub use hyper_client::{create_client, HyperClient, CONNECT_TIMEOUT, MAX_IDLE_CONN_DURATION};
