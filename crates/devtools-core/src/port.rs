//! Live handle to the artifact server's bound port.
//!
//! The file server may bind after the tools are registered, so consumers hold
//! a [`ServePort`] and read it at the point of use instead of copying the
//! number at startup.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::debug;

/// Shared, cloneable reference to a port that is published once the server binds.
///
/// A value of `0` means "not bound yet".
#[derive(Debug, Clone, Default)]
pub struct ServePort {
    inner: Arc<AtomicU16>,
}

static GLOBAL: OnceLock<ServePort> = OnceLock::new();

impl ServePort {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide handle shared by the gateway and the tool layer.
    pub fn global() -> &'static ServePort {
        GLOBAL.get_or_init(ServePort::new)
    }

    /// Publish the bound port.
    pub fn set(&self, port: u16) {
        debug!(port, "Serve port published");
        self.inner.store(port, Ordering::SeqCst);
    }

    /// Mark the server as no longer bound.
    pub fn clear(&self) {
        self.inner.store(0, Ordering::SeqCst);
    }

    /// Read the current port, `None` while the server has not bound.
    pub fn get(&self) -> Option<u16> {
        match self.inner.load(Ordering::SeqCst) {
            0 => None,
            port => Some(port),
        }
    }
}
