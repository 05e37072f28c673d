//! Shared key generation for upload backends.
//!
//! Key format: `{folder}/{uuid}-{sanitized file name}`.

use uuid::Uuid;

use crate::traits::{UploadError, UploadResult};

const MAX_FILE_NAME_LEN: usize = 200;

/// Reduce a user-supplied file name to a safe single path segment.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);
    if base.contains("..") {
        return "file".to_string();
    }
    let sanitized: String = base
        .chars()
        .take(MAX_FILE_NAME_LEN)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

/// Validate a destination folder hint and normalise its slashes.
pub fn normalize_folder(folder: &str) -> UploadResult<String> {
    let trimmed = folder.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(UploadError::InvalidKey("Folder must not be empty".to_string()));
    }
    if trimmed.contains("..") || trimmed.contains('\\') {
        return Err(UploadError::InvalidKey(format!(
            "Folder '{}' contains invalid characters",
            folder
        )));
    }
    Ok(trimmed.to_string())
}

/// Generate a storage key for the given folder and file name.
pub fn generate_storage_key(folder: &str, file_name: &str) -> UploadResult<String> {
    let folder = normalize_folder(folder)?;
    Ok(format!(
        "{}/{}-{}",
        folder,
        Uuid::new_v4(),
        sanitize_file_name(file_name)
    ))
}
