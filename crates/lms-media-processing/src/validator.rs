use lms_media_core::{AssetKind, IntakeConfig, MediaError, SourceAsset};
use std::path::Path;

/// Validation errors for files handed to intake
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    #[error("Content type {content_type} does not match extension '{extension}' (expected one of: {expected})")]
    ContentTypeMismatch {
        content_type: String,
        extension: String,
        expected: String,
    },

    #[error("Empty file")]
    EmptyFile,
}

impl From<ValidationError> for MediaError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { size, max } => MediaError::FileTooLarge {
                size_bytes: size,
                limit_bytes: max,
            },
            other => MediaError::InvalidInput(other.to_string()),
        }
    }
}

/// Intake file validator
///
/// Enforces per-kind size limits and, for videos, that the declared media
/// type agrees with the file extension.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_video_size: u64,
    max_attachment_size: u64,
}

impl UploadValidator {
    pub fn new(max_video_size: u64, max_attachment_size: u64) -> Self {
        Self {
            max_video_size,
            max_attachment_size,
        }
    }

    pub fn from_config(config: &IntakeConfig) -> Self {
        Self::new(config.max_video_size_bytes, config.max_attachment_size_bytes)
    }

    /// Validate file size
    pub fn validate_file_size(&self, kind: AssetKind, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        let max = match kind {
            AssetKind::Video => self.max_video_size,
            AssetKind::Attachment => self.max_attachment_size,
        };
        if size > max {
            return Err(ValidationError::FileTooLarge { size, max });
        }

        Ok(())
    }

    /// Validate content type shape (`type/subtype`)
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let valid = content_type
            .split_once('/')
            .map(|(major, minor)| {
                !major.trim().is_empty()
                    && !minor.trim().is_empty()
                    && !content_type.chars().any(|c| c.is_control())
            })
            .unwrap_or(false);

        if !valid {
            return Err(ValidationError::InvalidContentType(content_type.to_string()));
        }

        Ok(())
    }

    /// Validate that a video's media type matches its file extension
    pub fn validate_video_extension(
        &self,
        file_name: &str,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        let Some(extension) = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
        else {
            return Ok(());
        };

        let normalized = content_type.to_lowercase();
        let normalized = normalized.split(';').next().unwrap_or_default().trim();

        let expected: &[&str] = match extension.as_str() {
            "mp4" => &["video/mp4"],
            "m4v" => &["video/x-m4v", "video/mp4"],
            "webm" => &["video/webm"],
            "mov" => &["video/quicktime"],
            "avi" => &["video/x-msvideo", "video/avi"],
            "mkv" => &["video/x-matroska"],
            "ogv" => &["video/ogg"],
            _ => {
                tracing::debug!(
                    extension = %extension,
                    content_type = %content_type,
                    "Unknown video extension, skipping content type cross-check"
                );
                return Ok(());
            }
        };

        if !expected.iter().any(|ct| *ct == normalized) {
            return Err(ValidationError::ContentTypeMismatch {
                content_type: content_type.to_string(),
                extension,
                expected: expected.join(", "),
            });
        }

        Ok(())
    }

    /// Validate everything intake needs before uploading
    pub fn validate(&self, asset: &SourceAsset) -> Result<(), ValidationError> {
        self.validate_content_type(asset.content_type())?;
        let kind = asset.kind();
        self.validate_file_size(kind, asset.size())?;
        if kind == AssetKind::Video {
            self.validate_video_extension(asset.file_name(), asset.content_type())?;
        }
        Ok(())
    }
}

impl Default for UploadValidator {
    fn default() -> Self {
        Self::from_config(&IntakeConfig::default())
    }
}
