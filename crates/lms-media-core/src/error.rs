//! Error types module
//!
//! Every operation boundary of the media pipeline (intake, transcoding run,
//! session) reports failures as a [`MediaError`]. Lower layers keep their own
//! error enums (`UploadError`, `CodecError`, `ValidationError`) and convert
//! into this one with `From` impls.

use crate::constants::UPLOAD_FIRST_MESSAGE;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like an unreachable endpoint
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the author.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "UPLOAD_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same operation may succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the author
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from the internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Codec runtime failed to load: {0}")]
    AssetLoadFailed(String),

    #[error("Precondition not met: {0}")]
    PreconditionNotMet(String),

    #[error("Codec invocation failed for {label}: {message}")]
    CodecInvocationFailed { label: String, message: String },

    #[error("Upload to '{folder}' failed ({size_bytes} bytes): {message}")]
    UploadFailed {
        folder: String,
        size_bytes: u64,
        status: Option<u16>,
        message: String,
    },

    #[error("Upload endpoint unreachable while uploading to '{folder}' ({size_bytes} bytes): {message}")]
    UploadUnreachable {
        folder: String,
        size_bytes: u64,
        message: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {size_bytes} bytes (max: {limit_bytes} bytes)")]
    FileTooLarge { size_bytes: u64, limit_bytes: u64 },

    #[error("Transcoding run cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Precondition error for a transcoding request without a staged file.
    pub fn nothing_staged() -> Self {
        MediaError::PreconditionNotMet(UPLOAD_FIRST_MESSAGE.to_string())
    }
}

/// Result type for pipeline operations
pub type MediaResult<T> = Result<T, MediaError>;

impl From<std::io::Error> for MediaError {
    fn from(err: std::io::Error) -> Self {
        MediaError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for MediaError {
    fn from(err: serde_json::Error) -> Self {
        MediaError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn media_error_static_metadata(
    err: &MediaError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        MediaError::AssetLoadFailed(_) => (
            "CODEC_LOAD_FAILED",
            true,
            Some("Reload the editor to retry loading the video engine"),
            LogLevel::Error,
        ),
        MediaError::PreconditionNotMet(_) => (
            "PRECONDITION_NOT_MET",
            false,
            Some("Upload a video file before generating resolutions"),
            LogLevel::Debug,
        ),
        MediaError::CodecInvocationFailed { .. } => (
            "CODEC_INVOCATION_FAILED",
            true,
            Some("Try a different video file or retry the conversion"),
            LogLevel::Warn,
        ),
        MediaError::UploadFailed { .. } => (
            "UPLOAD_FAILED",
            true,
            Some("Retry the upload"),
            LogLevel::Warn,
        ),
        MediaError::UploadUnreachable { .. } => (
            "UPLOAD_UNREACHABLE",
            true,
            Some("Check your connection and retry the upload"),
            LogLevel::Warn,
        ),
        MediaError::InvalidInput(_) => (
            "INVALID_INPUT",
            false,
            Some("Check the selected file and try again"),
            LogLevel::Debug,
        ),
        MediaError::FileTooLarge { .. } => (
            "FILE_TOO_LARGE",
            false,
            Some("Choose a smaller file"),
            LogLevel::Debug,
        ),
        MediaError::Cancelled => ("CANCELLED", true, None, LogLevel::Debug),
        MediaError::Internal(_) => (
            "INTERNAL_ERROR",
            true,
            Some("Retry; contact support if this error persists"),
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for MediaError {
    fn error_code(&self) -> &'static str {
        media_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        media_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        media_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            MediaError::AssetLoadFailed(_) => "The video engine could not be loaded".to_string(),
            MediaError::PreconditionNotMet(msg) => msg.clone(),
            MediaError::CodecInvocationFailed { label, .. } => {
                format!("Video processing failed while creating {}. Please retry", label)
            }
            MediaError::UploadFailed { .. } | MediaError::UploadUnreachable { .. } => {
                "Upload failed. Please retry".to_string()
            }
            MediaError::InvalidInput(msg) => msg.clone(),
            MediaError::FileTooLarge { limit_bytes, .. } => format!(
                "File is too large (limit {} MB)",
                limit_bytes / (1024 * 1024)
            ),
            MediaError::Cancelled => "Video processing was cancelled".to_string(),
            MediaError::Internal(_) => "Something went wrong. Please retry".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        media_error_static_metadata(self).3
    }
}
