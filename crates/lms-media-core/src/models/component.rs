use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::resolution::ResolutionResult;

/// Identifier of a curriculum component, owned by the authoring side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ComponentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ComponentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Media state of one curriculum component, as rendered by the authoring UI.
///
/// `resolutions` is only ever present once a transcoding run has fully
/// completed, and never while `is_transcoding` is true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentAssetState {
    pub file_url: Option<String>,
    pub is_uploading: bool,
    pub is_transcoding: bool,
    pub transcoding_progress: u8,
    pub resolutions: Option<Vec<ResolutionResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ComponentAssetState {
    /// Whether the "Generate Resolutions" action should be offered.
    pub fn can_generate_resolutions(&self) -> bool {
        !self.is_transcoding && self.resolutions.is_none()
    }

    /// Progress a consumer may trust: the live value while transcoding, 100
    /// once resolutions exist, 0 otherwise.
    pub fn effective_progress(&self) -> u8 {
        if self.is_transcoding {
            self.transcoding_progress
        } else if self.resolutions.is_some() {
            100
        } else {
            0
        }
    }
}

/// A single named field write on a [`ComponentAssetState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum AssetField {
    FileUrl(Option<String>),
    IsUploading(bool),
    IsTranscoding(bool),
    TranscodingProgress(u8),
    Resolutions(Option<Vec<ResolutionResult>>),
    Title(String),
    Content(String),
}

impl AssetField {
    pub fn name(&self) -> &'static str {
        match self {
            AssetField::FileUrl(_) => "fileUrl",
            AssetField::IsUploading(_) => "isUploading",
            AssetField::IsTranscoding(_) => "isTranscoding",
            AssetField::TranscodingProgress(_) => "transcodingProgress",
            AssetField::Resolutions(_) => "resolutions",
            AssetField::Title(_) => "title",
            AssetField::Content(_) => "content",
        }
    }

    /// Write this field into `state`, leaving every other field untouched.
    pub fn apply(self, state: &mut ComponentAssetState) {
        match self {
            AssetField::FileUrl(url) => state.file_url = url,
            AssetField::IsUploading(flag) => state.is_uploading = flag,
            AssetField::IsTranscoding(flag) => state.is_transcoding = flag,
            AssetField::TranscodingProgress(percent) => {
                state.transcoding_progress = percent.min(100)
            }
            AssetField::Resolutions(resolutions) => state.resolutions = resolutions,
            AssetField::Title(title) => state.title = Some(title),
            AssetField::Content(content) => state.content = Some(content),
        }
    }
}
