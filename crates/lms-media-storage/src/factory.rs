#[cfg(feature = "storage-http")]
use crate::HttpUploader;
#[cfg(feature = "storage-local")]
use crate::LocalUploader;
use crate::{ObjectUploader, RetryPolicy, RetryingUploader, UploadBackend, UploadError, UploadResult};
use lms_media_core::StorageConfig;
use std::sync::Arc;

/// Create an upload backend based on configuration
///
/// The backend is wrapped in a [`RetryingUploader`] when `max_retries > 0`.
pub async fn create_uploader(config: &StorageConfig) -> UploadResult<Arc<dyn ObjectUploader>> {
    let backend: Arc<dyn ObjectUploader> = match config.backend {
        #[cfg(feature = "storage-http")]
        UploadBackend::Http => Arc::new(HttpUploader::new(
            config.upload_endpoint.clone(),
            config.upload_timeout,
        )?),

        #[cfg(not(feature = "storage-http"))]
        UploadBackend::Http => {
            return Err(UploadError::ConfigError(
                "HTTP upload backend not available (storage-http feature not enabled)".to_string(),
            ))
        }

        #[cfg(feature = "storage-local")]
        UploadBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                UploadError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
                UploadError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;
            Arc::new(LocalUploader::new(base_path, base_url).await?)
        }

        #[cfg(not(feature = "storage-local"))]
        UploadBackend::Local => {
            return Err(UploadError::ConfigError(
                "Local upload backend not available (storage-local feature not enabled)"
                    .to_string(),
            ))
        }
    };

    tracing::info!(
        backend = %config.backend,
        max_retries = config.max_retries,
        "Upload backend initialized"
    );

    if config.max_retries == 0 {
        return Ok(backend);
    }

    Ok(Arc::new(RetryingUploader::new(
        backend,
        RetryPolicy {
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay,
            max_delay: config.retry_max_delay,
        },
    )))
}
