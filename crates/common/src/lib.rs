//! Common types, wire constants, and errors shared across `mtls-server` crates.

pub mod error;
pub mod protocol;

pub use error::BootstrapError;
