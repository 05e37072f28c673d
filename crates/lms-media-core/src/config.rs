//! Configuration module
//!
//! Storage, codec and intake settings for the media pipeline, loaded from the
//! environment (and an optional `.env` file).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{DEFAULT_RESOLUTIONS, DEFAULT_UPLOAD_ENDPOINT};
use crate::models::resolution::{parse_resolution_specs, ResolutionSpec};
use crate::storage_types::UploadBackend;

const UPLOAD_TIMEOUT_SECS: u64 = 120;
const UPLOAD_MAX_RETRIES: u32 = 2;
const UPLOAD_RETRY_BASE_DELAY_MS: u64 = 500;
const UPLOAD_RETRY_MAX_DELAY_MS: u64 = 30_000;
const TRANSCODE_TIMEOUT_SECS: u64 = 600;
const MAX_VIDEO_SIZE_MB: u64 = 500;
const MAX_ATTACHMENT_SIZE_MB: u64 = 50;

/// Where and how uploads are sent.
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: UploadBackend,
    pub upload_endpoint: String,
    pub upload_timeout: Duration,
    /// Retries for unreachable-endpoint failures only. 0 = disabled.
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: UploadBackend::Http,
            upload_endpoint: DEFAULT_UPLOAD_ENDPOINT.to_string(),
            upload_timeout: Duration::from_secs(UPLOAD_TIMEOUT_SECS),
            max_retries: UPLOAD_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(UPLOAD_RETRY_BASE_DELAY_MS),
            retry_max_delay: Duration::from_millis(UPLOAD_RETRY_MAX_DELAY_MS),
            local_storage_path: None,
            local_storage_base_url: None,
        }
    }
}

/// Codec engine settings and the ordered derivative list.
#[derive(Clone, Debug)]
pub struct CodecConfig {
    pub ffmpeg_path: String,
    pub transcode_timeout: Duration,
    pub resolutions: Vec<ResolutionSpec>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            transcode_timeout: Duration::from_secs(TRANSCODE_TIMEOUT_SECS),
            resolutions: vec![
                ResolutionSpec::new("720p", "1280:720"),
                ResolutionSpec::new("480p (SD)", "854:480"),
            ],
        }
    }
}

/// Per-kind intake size limits.
#[derive(Clone, Debug)]
pub struct IntakeConfig {
    pub max_video_size_bytes: u64,
    pub max_attachment_size_bytes: u64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_video_size_bytes: MAX_VIDEO_SIZE_MB * 1024 * 1024,
            max_attachment_size_bytes: MAX_ATTACHMENT_SIZE_MB * 1024 * 1024,
        }
    }
}

/// Application configuration for the media pipeline.
#[derive(Clone, Debug, Default)]
pub struct MediaConfig {
    pub environment: String,
    pub storage: StorageConfig,
    pub codec: CodecConfig,
    pub intake: IntakeConfig,
}

impl MediaConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let backend = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw.parse::<UploadBackend>()?,
            None => UploadBackend::Http,
        };

        let storage = StorageConfig {
            backend,
            upload_endpoint: lookup("UPLOAD_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_UPLOAD_ENDPOINT.to_string()),
            upload_timeout: Duration::from_secs(parse_or(
                &lookup,
                "UPLOAD_TIMEOUT_SECS",
                UPLOAD_TIMEOUT_SECS,
            )),
            max_retries: parse_or(&lookup, "UPLOAD_MAX_RETRIES", UPLOAD_MAX_RETRIES),
            retry_base_delay: Duration::from_millis(parse_or(
                &lookup,
                "UPLOAD_RETRY_BASE_DELAY_MS",
                UPLOAD_RETRY_BASE_DELAY_MS,
            )),
            retry_max_delay: Duration::from_millis(UPLOAD_RETRY_MAX_DELAY_MS),
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
            local_storage_base_url: lookup("LOCAL_STORAGE_BASE_URL"),
        };

        let resolutions_raw =
            lookup("RESOLUTIONS").unwrap_or_else(|| DEFAULT_RESOLUTIONS.to_string());
        let resolutions = parse_resolution_specs(&resolutions_raw)
            .map_err(|e| anyhow::anyhow!("RESOLUTIONS is invalid: {}", e))?;

        let codec = CodecConfig {
            ffmpeg_path: lookup("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            transcode_timeout: Duration::from_secs(parse_or(
                &lookup,
                "TRANSCODE_TIMEOUT_SECS",
                TRANSCODE_TIMEOUT_SECS,
            )),
            resolutions,
        };

        let intake = IntakeConfig {
            max_video_size_bytes: megabytes(parse_or(
                &lookup,
                "MAX_VIDEO_SIZE_MB",
                MAX_VIDEO_SIZE_MB,
            )),
            max_attachment_size_bytes: megabytes(parse_or(
                &lookup,
                "MAX_ATTACHMENT_SIZE_MB",
                MAX_ATTACHMENT_SIZE_MB,
            )),
        };

        let config = MediaConfig {
            environment,
            storage,
            codec,
            intake,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage.backend {
            UploadBackend::Http => {
                let endpoint = &self.storage.upload_endpoint;
                if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                    return Err(anyhow::anyhow!(
                        "UPLOAD_ENDPOINT must be an http(s) URL, got '{}'",
                        endpoint
                    ));
                }
                if self.is_production() && endpoint.starts_with("http://localhost") {
                    return Err(anyhow::anyhow!(
                        "UPLOAD_ENDPOINT cannot point at localhost in production"
                    ));
                }
            }
            UploadBackend::Local => {
                if self.storage.local_storage_path.is_none()
                    || self.storage.local_storage_base_url.is_none()
                {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set for the local backend"
                    ));
                }
            }
        }

        if self.storage.upload_timeout.is_zero() {
            return Err(anyhow::anyhow!("UPLOAD_TIMEOUT_SECS must be greater than 0"));
        }
        if self.codec.transcode_timeout.is_zero() {
            return Err(anyhow::anyhow!("TRANSCODE_TIMEOUT_SECS must be greater than 0"));
        }
        if self.codec.ffmpeg_path.trim().is_empty() {
            return Err(anyhow::anyhow!("FFMPEG_PATH must not be empty"));
        }

        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

/// Byte count for a limit given in MB, capped at `u64::MAX`.
fn megabytes(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}
