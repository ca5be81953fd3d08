#[cfg(test)]
mod tests;

#[cfg(test)]
pub use tests::support;

pub mod config;
pub mod driver;
pub mod http;
pub mod model;
pub mod probe;
pub mod registry;
pub mod shutdown;
pub mod systemd;
pub mod tags;
