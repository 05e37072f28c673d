use serde::{Deserialize, Serialize};

use crate::constants::VIDEO_FOLDER_PREFIX;
use crate::error::MediaError;

/// One target derivative of a source video.
///
/// `scale_expression` is handed to the codec's scale filter verbatim
/// (`1280:720`, `854:-2`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSpec {
    pub label: String,
    pub scale_expression: String,
    pub output_name: String,
}

impl ResolutionSpec {
    /// Build a spec whose output name is derived from the label
    /// (`"480p (SD)"` → `output_480p.mp4`).
    pub fn new(label: impl Into<String>, scale_expression: impl Into<String>) -> Self {
        let label = label.into();
        let stem: String = label
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        let output_name = if stem.is_empty() {
            "output.mp4".to_string()
        } else {
            format!("output_{}.mp4", stem)
        };

        Self {
            label,
            scale_expression: scale_expression.into(),
            output_name,
        }
    }

    /// Destination folder for this variant: the label with all whitespace
    /// stripped, under `videos/`.
    pub fn folder(&self) -> String {
        let compact: String = self.label.chars().filter(|c| !c.is_whitespace()).collect();
        format!("{}/{}", VIDEO_FOLDER_PREFIX, compact)
    }

    /// Media type of the produced file, derived from the output name's extension.
    pub fn output_content_type(&self) -> &'static str {
        let extension = self
            .output_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "mp4" | "m4v" => "video/mp4",
            "webm" => "video/webm",
            "mov" => "video/quicktime",
            "mkv" => "video/x-matroska",
            _ => "application/octet-stream",
        }
    }

    /// Reject specs the codec cannot be given safely.
    pub fn validate(&self) -> Result<(), MediaError> {
        if self.label.trim().is_empty() {
            return Err(MediaError::InvalidInput(
                "Resolution label must not be empty".to_string(),
            ));
        }

        let (width, height) = self.scale_expression.split_once(':').ok_or_else(|| {
            MediaError::InvalidInput(format!(
                "Scale expression '{}' must have the form width:height",
                self.scale_expression
            ))
        })?;

        let allowed = |c: char| c.is_ascii_alphanumeric() || "-+*/()._".contains(c);
        for side in [width, height] {
            if side.is_empty() || !side.chars().all(allowed) {
                return Err(MediaError::InvalidInput(format!(
                    "Scale expression '{}' contains an invalid dimension",
                    self.scale_expression
                )));
            }
        }

        if self.output_name.is_empty()
            || self.output_name.contains('/')
            || self.output_name.contains("..")
        {
            return Err(MediaError::InvalidInput(format!(
                "Output name '{}' is not a plain file name",
                self.output_name
            )));
        }

        Ok(())
    }
}

/// Parse an ordered resolution list of the form `label=scale;label=scale`.
///
/// Empty entries are ignored; the order of the input is preserved.
pub fn parse_resolution_specs(raw: &str) -> Result<Vec<ResolutionSpec>, MediaError> {
    let mut specs = Vec::new();

    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (label, scale) = entry.split_once('=').ok_or_else(|| {
            MediaError::InvalidInput(format!(
                "Resolution entry '{}' must have the form label=width:height",
                entry
            ))
        })?;
        let spec = ResolutionSpec::new(label.trim(), scale.trim());
        spec.validate()?;
        specs.push(spec);
    }

    Ok(specs)
}

/// One produced (or passthrough) variant of a source video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub label: String,
    pub url: String,
    pub size_description: String,
}

/// Human-readable size in megabytes with one decimal (`52428800` → `"50.0MB"`).
pub fn describe_size(size_bytes: u64) -> String {
    format!("{:.1}MB", size_bytes as f64 / (1024.0 * 1024.0))
}
