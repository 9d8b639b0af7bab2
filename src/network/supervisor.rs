//! Handler supervision
//!
//! The server-owned registry of live connections and the shutdown signal that
//! every handler observes at its blocking points.

use std::collections::HashMap;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Cloneable shutdown flag
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Idempotent.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Live connections, keyed by handler id
///
/// Each entry is a second handle to the handler's socket. Shutting it down
/// wakes a handler blocked in a read with end-of-stream.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    active: Mutex<HashMap<u64, TcpStream>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `stream` under `id`; the entry lives as long as the returned guard
    pub fn register(self: &Arc<Self>, id: u64, stream: TcpStream) -> Registration {
        self.active.lock().insert(id, stream);
        Registration {
            id,
            registry: Arc::clone(self),
        }
    }

    /// Number of handlers currently registered
    pub fn len(&self) -> usize {
        self.active.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.lock().is_empty()
    }

    /// Shut down every registered socket in both directions
    ///
    /// Entries stay registered until their handlers exit.
    pub fn close_all(&self) {
        let active = self.active.lock();
        for (id, stream) in active.iter() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                // Already closed by the peer is the common case here
                tracing::debug!(id, error = %e, "shutdown of registered connection failed");
            }
        }
    }

    fn deregister(&self, id: u64) {
        self.active.lock().remove(&id);
    }
}

/// Removes its connection from the registry on drop
#[derive(Debug)]
pub struct Registration {
    id: u64,
    registry: Arc<ConnectionRegistry>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.deregister(self.id);
    }
}
