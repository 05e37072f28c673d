//! Folder names, labels and endpoints used by the media pipeline.

/// Storage endpoint used when `UPLOAD_ENDPOINT` is not set.
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "http://localhost:5000/api/upload";

/// Folder for raw video files uploaded at intake time.
pub const RAW_VIDEO_FOLDER: &str = "videos/raw";

/// Folder for every non-video upload.
pub const ATTACHMENTS_FOLDER: &str = "attachments";

/// Prefix of every video variant folder.
pub const VIDEO_FOLDER_PREFIX: &str = "videos";

/// Folder that receives the untouched source video of a transcoding run.
pub const ORIGINAL_VARIANT_FOLDER: &str = "videos/1080p";

/// Display label of the untouched source video.
///
/// The source resolution is never probed; the original is presented as the
/// highest-quality variant.
pub const ORIGINAL_VARIANT_LABEL: &str = "1080p (HD)";

/// Resolution list used when `RESOLUTIONS` is not set.
pub const DEFAULT_RESOLUTIONS: &str = "720p=1280:720;480p (SD)=854:480";

/// User-visible text when transcoding is requested without a staged file.
pub const UPLOAD_FIRST_MESSAGE: &str = "Please upload a file first";
