//! Upload abstraction trait
//!
//! This module defines the ObjectUploader trait that all upload backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use lms_media_core::{MediaError, UploadBackend, UploadOutcome};
use thiserror::Error;

/// Upload operation errors
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload to '{folder}' failed with status {status} ({size_bytes} bytes): {message}")]
    UploadFailed {
        folder: String,
        size_bytes: u64,
        status: u16,
        message: String,
    },

    #[error("Upload endpoint unreachable for '{folder}' ({size_bytes} bytes): {message}")]
    Unreachable {
        folder: String,
        size_bytes: u64,
        message: String,
    },

    #[error("Invalid upload response for '{folder}': {message}")]
    InvalidResponse { folder: String, message: String },

    #[error("Invalid upload request: {0}")]
    InvalidRequest(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl UploadError {
    /// Whether the failure happened before any response was received.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, UploadError::Unreachable { .. })
    }
}

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

impl From<UploadError> for MediaError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::UploadFailed {
                folder,
                size_bytes,
                status,
                message,
            } => MediaError::UploadFailed {
                folder,
                size_bytes,
                status: Some(status),
                message,
            },
            UploadError::Unreachable {
                folder,
                size_bytes,
                message,
            } => MediaError::UploadUnreachable {
                folder,
                size_bytes,
                message,
            },
            UploadError::InvalidResponse { folder, message } => MediaError::UploadFailed {
                folder,
                size_bytes: 0,
                status: None,
                message,
            },
            UploadError::InvalidRequest(msg) | UploadError::InvalidKey(msg) => {
                MediaError::InvalidInput(msg)
            }
            UploadError::IoError(e) => MediaError::Internal(format!("IO error: {}", e)),
            UploadError::ConfigError(msg) => MediaError::Internal(msg),
        }
    }
}

/// A single blob to persist.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub data: Bytes,
    pub content_type: String,
    pub file_name: String,
    /// Destination folder hint, e.g. `videos/raw`.
    pub folder: String,
}

impl UploadRequest {
    pub fn new(
        data: impl Into<Bytes>,
        content_type: impl Into<String>,
        file_name: impl Into<String>,
        folder: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
            file_name: file_name.into(),
            folder: folder.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Upload abstraction trait
///
/// A call either yields a usable URL or fails entirely; partial uploads are
/// never reported as success. Implementations do not retry on their own;
/// wrap them in [`RetryingUploader`](crate::RetryingUploader) for that.
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    /// Persist the blob and return its public URL.
    async fn upload(&self, request: UploadRequest) -> UploadResult<UploadOutcome>;

    /// Get the upload backend type
    fn backend_type(&self) -> UploadBackend;
}
