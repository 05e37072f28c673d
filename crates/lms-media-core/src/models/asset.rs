use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::constants::{ATTACHMENTS_FOLDER, RAW_VIDEO_FOLDER};

/// A file chosen by the author, as handed over by the file picker.
///
/// The byte buffer is reference counted, so clones are cheap and the content
/// is immutable once staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAsset {
    data: Bytes,
    content_type: String,
    file_name: String,
}

impl SourceAsset {
    pub fn new(
        data: impl Into<Bytes>,
        content_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
            file_name: file_name.into(),
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn kind(&self) -> AssetKind {
        AssetKind::classify(&self.content_type)
    }
}

/// Routing class of an incoming file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Video,
    Attachment,
}

impl AssetKind {
    /// `video/*` is a video, everything else is an attachment.
    pub fn classify(content_type: &str) -> Self {
        let major = content_type
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if major == "video" && content_type.contains('/') {
            AssetKind::Video
        } else {
            AssetKind::Attachment
        }
    }

    /// Destination folder for the intake upload.
    pub fn intake_folder(&self) -> &'static str {
        match self {
            AssetKind::Video => RAW_VIDEO_FOLDER,
            AssetKind::Attachment => ATTACHMENTS_FOLDER,
        }
    }
}

impl Display for AssetKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AssetKind::Video => write!(f, "video"),
            AssetKind::Attachment => write!(f, "attachment"),
        }
    }
}

/// Successful storage upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_major_media_type() {
        assert_eq!(AssetKind::classify("video/mp4"), AssetKind::Video);
        assert_eq!(AssetKind::classify("Video/QuickTime"), AssetKind::Video);
        assert_eq!(AssetKind::classify("application/pdf"), AssetKind::Attachment);
        assert_eq!(AssetKind::classify("video"), AssetKind::Attachment);
        assert_eq!(AssetKind::classify(""), AssetKind::Attachment);
    }

    #[test]
    fn intake_folders() {
        assert_eq!(AssetKind::Video.intake_folder(), "videos/raw");
        assert_eq!(AssetKind::Attachment.intake_folder(), "attachments");
    }

    #[test]
    fn source_asset_reports_size_and_kind() {
        let asset = SourceAsset::new(vec![0u8; 2048], "video/webm", "intro.webm");
        assert_eq!(asset.size(), 2048);
        assert_eq!(asset.kind(), AssetKind::Video);
        assert_eq!(asset.file_name(), "intro.webm");
    }
}
