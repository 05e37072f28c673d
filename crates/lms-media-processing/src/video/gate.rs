//! Single-flight access to a shared codec runtime.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use lms_media_core::ResolutionSpec;
use tokio::sync::Mutex;

use super::codec::{CodecError, CodecRuntime};

/// Serialises `transcode` calls across every run in a session.
///
/// Waiters are served in arrival order (the async mutex is FIFO fair), so a
/// run queued behind another component's run is never starved. Uploads are
/// not gated; only the codec call itself holds the gate.
pub struct CodecGate {
    inner: Arc<dyn CodecRuntime>,
    lock: Mutex<()>,
    pending: AtomicUsize,
}

impl CodecGate {
    pub fn new(inner: Arc<dyn CodecRuntime>) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
            pending: AtomicUsize::new(0),
        }
    }

    /// Calls currently waiting for or holding the gate.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

struct PendingGuard<'a>(&'a AtomicUsize);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CodecRuntime for CodecGate {
    async fn ensure_loaded(&self) -> Result<(), CodecError> {
        self.inner.ensure_loaded().await
    }

    fn is_loaded(&self) -> bool {
        self.inner.is_loaded()
    }

    async fn transcode(&self, input: Bytes, spec: &ResolutionSpec) -> Result<Bytes, CodecError> {
        let queued = self.pending.fetch_add(1, Ordering::SeqCst);
        let _pending = PendingGuard(&self.pending);
        if queued > 0 {
            tracing::debug!(label = %spec.label, queued, "Waiting for codec gate");
        }

        let _permit = self.lock.lock().await;
        self.inner.transcode(input, spec).await
    }
}
