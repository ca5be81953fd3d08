//! Registry-neutral data model.

pub mod registration;

pub use registration::{Registration, Weights};
