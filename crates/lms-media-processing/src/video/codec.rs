//! Codec runtime abstraction.

use async_trait::async_trait;
use bytes::Bytes;
use lms_media_core::{MediaError, ResolutionSpec};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Codec engine failed to load: {0}")]
    LoadFailed(String),

    #[error("Codec engine is not loaded")]
    NotLoaded,

    #[error("Transcode to {label} failed: {message}")]
    InvocationFailed { label: String, message: String },

    #[error("Transcode to {label} timed out after {seconds}s")]
    Timeout { label: String, seconds: u64 },

    #[error("Codec IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CodecError> for MediaError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::LoadFailed(message) => MediaError::AssetLoadFailed(message),
            CodecError::NotLoaded => {
                MediaError::PreconditionNotMet("Codec engine is not ready".to_string())
            }
            CodecError::InvocationFailed { label, message } => {
                MediaError::CodecInvocationFailed { label, message }
            }
            CodecError::Timeout { label, seconds } => MediaError::CodecInvocationFailed {
                label,
                message: format!("timed out after {}s", seconds),
            },
            CodecError::Io(e) => MediaError::Internal(format!("Codec IO error: {}", e)),
        }
    }
}

/// A transcoding engine shared by every run in a session.
///
/// Implementations are not required to tolerate concurrent `transcode`
/// calls; wrap them in [`CodecGate`](super::CodecGate) before sharing.
#[async_trait]
pub trait CodecRuntime: Send + Sync {
    /// Load the engine once. Idempotent after the first success.
    async fn ensure_loaded(&self) -> Result<(), CodecError>;

    fn is_loaded(&self) -> bool;

    /// Rescale the video stream of `input` per `spec`, copying audio unchanged.
    ///
    /// Fails with [`CodecError::NotLoaded`] before a successful load.
    async fn transcode(&self, input: Bytes, spec: &ResolutionSpec) -> Result<Bytes, CodecError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_a_codec_invocation_failure() {
        let err: MediaError = CodecError::Timeout {
            label: "720p".to_string(),
            seconds: 600,
        }
        .into();
        match err {
            MediaError::CodecInvocationFailed { label, message } => {
                assert_eq!(label, "720p");
                assert!(message.contains("600"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn load_failure_maps_to_asset_load_failed() {
        let err: MediaError = CodecError::LoadFailed("missing binary".into()).into();
        assert!(matches!(err, MediaError::AssetLoadFailed(_)));

        let err: MediaError = CodecError::NotLoaded.into();
        assert!(matches!(err, MediaError::PreconditionNotMet(_)));
    }
}
