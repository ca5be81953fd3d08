// HTTP plumbing shared by the registry transport.

pub mod client;
pub mod request;

pub use client::{create_client, HyperClient};
pub use request::{send, HttpResponse};
