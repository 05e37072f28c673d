//! Caller-side retry policy for uploads.
//!
//! Only [`UploadError::Unreachable`] is retried: a non-success status means
//! the endpoint saw the request and rejected it.

use async_trait::async_trait;
use lms_media_core::{UploadBackend, UploadOutcome};
use std::sync::Arc;
use std::time::Duration;

use crate::traits::{ObjectUploader, UploadRequest, UploadResult};

/// Exponential backoff settings.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based), doubling each time and capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Decorator that retries unreachable-endpoint failures with backoff.
pub struct RetryingUploader {
    inner: Arc<dyn ObjectUploader>,
    policy: RetryPolicy,
}

impl RetryingUploader {
    pub fn new(inner: Arc<dyn ObjectUploader>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl ObjectUploader for RetryingUploader {
    async fn upload(&self, request: UploadRequest) -> UploadResult<UploadOutcome> {
        let mut attempt = 0u32;
        loop {
            match self.inner.upload(request.clone()).await {
                Err(e) if e.is_unreachable() && attempt < self.policy.max_retries => {
                    let delay = self.policy.backoff(attempt);
                    tracing::warn!(
                        folder = %request.folder,
                        attempt = attempt + 1,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Upload endpoint unreachable, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn backend_type(&self) -> UploadBackend {
        self.inner.backend_type()
    }
}
