use crate::keys::generate_storage_key;
use crate::traits::{ObjectUploader, UploadError, UploadRequest, UploadResult};
use crate::UploadBackend;
use async_trait::async_trait;
use lms_media_core::UploadOutcome;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem uploader, for offline authoring and tests.
#[derive(Clone, Debug)]
pub struct LocalUploader {
    base_path: PathBuf,
    base_url: String,
}

impl LocalUploader {
    /// Create a new LocalUploader instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for uploaded files (e.g., "/var/lib/lms/media")
    /// * `base_url` - Base URL the directory is served from (e.g., "http://localhost:8080/media")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> UploadResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            UploadError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalUploader {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with security validation
    fn key_to_path(&self, storage_key: &str) -> UploadResult<PathBuf> {
        if storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(UploadError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(storage_key))
    }

    /// Generate public URL for file
    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> UploadResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectUploader for LocalUploader {
    async fn upload(&self, request: UploadRequest) -> UploadResult<UploadOutcome> {
        let key = generate_storage_key(&request.folder, &request.file_name)?;
        let path = self.key_to_path(&key)?;
        let size = request.size();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let write_failed = |e: std::io::Error| UploadError::UploadFailed {
            folder: request.folder.clone(),
            size_bytes: size,
            status: 500,
            message: format!("Failed to write file {}: {}", path.display(), e),
        };

        let mut file = fs::File::create(&path).await.map_err(write_failed)?;
        file.write_all(&request.data).await.map_err(write_failed)?;
        file.sync_all().await.map_err(write_failed)?;

        let url = self.generate_url(&key);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local upload successful"
        );

        Ok(UploadOutcome { url })
    }

    fn backend_type(&self) -> UploadBackend {
        UploadBackend::Local
    }
}
