//! End-to-end tests for tagit.
//!
//! These drive the polling loop, one-shot cleanup and the Consul transport
//! against in-memory fakes and a fake agent served over HTTP.


pub mod support;
