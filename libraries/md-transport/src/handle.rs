/// Serial ownership of a device transport
use md_core::DeviceTransport;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

/// Exclusive access to the transport for the duration of one operation
pub type TransportGuard = OwnedMutexGuard<Box<dyn DeviceTransport>>;

/// Shared, cloneable handle to the single connected device.
///
/// A device executes one command at a time, and some operations (a drag, a
/// whole upload session) are only correct when nothing else runs between
/// their commands. Callers take the guard once per logical operation and
/// keep it until the operation is done.
#[derive(Clone)]
pub struct TransportHandle {
    inner: Arc<Mutex<Box<dyn DeviceTransport>>>,
}

impl TransportHandle {
    pub fn new(transport: impl DeviceTransport + 'static) -> Self {
        Self::from_boxed(Box::new(transport))
    }

    pub fn from_boxed(transport: Box<dyn DeviceTransport>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(transport)),
        }
    }

    /// Wait for the device and take it
    pub async fn acquire(&self) -> TransportGuard {
        trace!("Waiting for transport");
        self.inner.clone().lock_owned().await
    }

    /// Take the device only if nobody holds it
    pub fn try_acquire(&self) -> Option<TransportGuard> {
        self.inner.clone().try_lock_owned().ok()
    }
}

impl std::fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportHandle")
            .field("busy", &self.inner.try_lock().is_err())
            .finish()
    }
}
