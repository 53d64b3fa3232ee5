//! HTTP gateway.
//!
//! Serves saved artifacts under `/tmp/<filename>` and exposes the tool
//! registry over HTTP. The bound port is published through
//! [`devtools_core::ServePort`] so artifact URLs resolve to it.

pub mod server;
pub mod state;

pub use server::{router, start_gateway};
pub use state::GatewayState;
