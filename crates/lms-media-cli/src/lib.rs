use std::path::Path;

use anyhow::Context;
use lms_media_core::{AssetField, SourceAsset};
use lms_media_processing::AssetEvent;

/// Initialize tracing for the CLI.
///
/// `RUST_LOG` overrides the default `info` filter. Logs go to stderr so
/// stdout stays parseable.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Media type for a path, guessed from its extension.
pub fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Read a file from disk as it would arrive from the file picker.
pub async fn read_source(path: &Path) -> anyhow::Result<SourceAsset> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Path has no file name")?
        .to_string();

    Ok(SourceAsset::new(data, guess_content_type(path), file_name))
}

/// One-line rendering of a binder event for terminal progress output.
pub fn describe_event(event: &AssetEvent) -> String {
    let id = &event.component_id;
    match &event.field {
        AssetField::FileUrl(Some(url)) => format!("[{}] file url: {}", id, url),
        AssetField::FileUrl(None) => format!("[{}] file url cleared", id),
        AssetField::IsUploading(true) => format!("[{}] uploading...", id),
        AssetField::IsUploading(false) => format!("[{}] upload finished", id),
        AssetField::IsTranscoding(true) => format!("[{}] transcoding...", id),
        AssetField::IsTranscoding(false) => format!("[{}] transcoding finished", id),
        AssetField::TranscodingProgress(percent) => format!("[{}] progress {}%", id, percent),
        AssetField::Resolutions(Some(list)) => {
            let labels: Vec<_> = list.iter().map(|r| r.label.as_str()).collect();
            format!("[{}] resolutions: {}", id, labels.join(", "))
        }
        AssetField::Resolutions(None) => format!("[{}] resolutions cleared", id),
        AssetField::Title(title) => format!("[{}] title: {}", id, title),
        AssetField::Content(_) => format!("[{}] content updated", id),
    }
}
