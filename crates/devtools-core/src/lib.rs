//! Core config, errors, and shared handles for devtools-claw.

pub mod config;
pub mod error;
pub mod port;

pub use port::ServePort;
