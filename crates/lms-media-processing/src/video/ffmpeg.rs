//! FFmpeg-backed codec runtime.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use lms_media_core::{CodecConfig, ResolutionSpec};
use tempfile::TempDir;
use tokio::process::Command;
use tokio::sync::OnceCell;

use super::codec::{CodecError, CodecRuntime};

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const STDERR_TAIL_BYTES: usize = 512;

/// What the engine reported about itself when it was loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    pub version: String,
}

/// Validate that a binary path doesn't contain shell metacharacters
fn validate_binary_path(path: &str) -> Result<(), CodecError> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.trim().is_empty() || path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(CodecError::LoadFailed(format!(
            "Invalid ffmpeg path: {}",
            path
        )));
    }
    if path.contains("..") {
        return Err(CodecError::LoadFailed(format!(
            "Invalid ffmpeg path (directory traversal): {}",
            path
        )));
    }
    Ok(())
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_TAIL_BYTES {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}

/// Codec runtime driving an FFmpeg binary.
///
/// The binary is probed lazily on the first [`ensure_loaded`] call and the
/// result is kept for the lifetime of the runtime. A failed probe leaves the
/// runtime unloaded, so the next call probes again.
///
/// Every `transcode` works in its own temporary directory which is removed
/// when the call returns; nothing accumulates between runs.
///
/// [`ensure_loaded`]: CodecRuntime::ensure_loaded
pub struct FfmpegRuntime {
    ffmpeg_path: String,
    timeout: Duration,
    engine: OnceCell<EngineInfo>,
}

impl FfmpegRuntime {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Result<Self, CodecError> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_binary_path(&ffmpeg_path)?;

        Ok(Self {
            ffmpeg_path,
            timeout,
            engine: OnceCell::new(),
        })
    }

    pub fn from_config(config: &CodecConfig) -> Result<Self, CodecError> {
        Self::new(config.ffmpeg_path.clone(), config.transcode_timeout)
    }

    /// Engine details, once loaded.
    pub fn engine_info(&self) -> Option<&EngineInfo> {
        self.engine.get()
    }

    async fn probe(&self) -> Result<EngineInfo, CodecError> {
        let output = tokio::time::timeout(
            PROBE_TIMEOUT,
            Command::new(&self.ffmpeg_path)
                .arg("-version")
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| CodecError::LoadFailed("ffmpeg -version timed out".to_string()))?
        .map_err(|e| {
            CodecError::LoadFailed(format!("Failed to execute {}: {}", self.ffmpeg_path, e))
        })?;

        if !output.status.success() {
            return Err(CodecError::LoadFailed(format!(
                "ffmpeg -version exited with {}: {}",
                output.status,
                stderr_tail(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let first_line = stdout.lines().next().unwrap_or_default().trim();
        let version = first_line
            .strip_prefix("ffmpeg version ")
            .and_then(|rest| rest.split_whitespace().next())
            .unwrap_or(first_line)
            .to_string();

        if version.is_empty() {
            return Err(CodecError::LoadFailed(
                "ffmpeg -version produced no version line".to_string(),
            ));
        }

        Ok(EngineInfo { version })
    }

    async fn run_scale(
        &self,
        input_path: &Path,
        output_path: &Path,
        spec: &ResolutionSpec,
    ) -> Result<(), CodecError> {
        let mut command = Command::new(&self.ffmpeg_path);
        command
            .arg("-hide_banner")
            .arg("-nostdin")
            .arg("-y")
            .arg("-i")
            .arg(input_path)
            .arg("-vf")
            .arg(format!("scale={}", spec.scale_expression))
            .arg("-c:a")
            .arg("copy")
            .arg(output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| CodecError::Timeout {
                label: spec.label.clone(),
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| CodecError::InvocationFailed {
                label: spec.label.clone(),
                message: format!("Failed to execute ffmpeg: {}", e),
            })?;

        if !output.status.success() {
            return Err(CodecError::InvocationFailed {
                label: spec.label.clone(),
                message: format!(
                    "ffmpeg exited with {}: {}",
                    output.status,
                    stderr_tail(&output.stderr)
                ),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl CodecRuntime for FfmpegRuntime {
    async fn ensure_loaded(&self) -> Result<(), CodecError> {
        let info = self
            .engine
            .get_or_try_init(|| async {
                let info = self.probe().await;
                match &info {
                    Ok(info) => tracing::info!(
                        ffmpeg_path = %self.ffmpeg_path,
                        version = %info.version,
                        "Codec engine loaded"
                    ),
                    Err(e) => tracing::error!(
                        ffmpeg_path = %self.ffmpeg_path,
                        error = %e,
                        "Codec engine failed to load"
                    ),
                }
                info
            })
            .await?;

        tracing::trace!(version = %info.version, "Codec engine ready");
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }

    #[tracing::instrument(skip(self, input), fields(label = %spec.label, input_bytes = input.len()))]
    async fn transcode(&self, input: Bytes, spec: &ResolutionSpec) -> Result<Bytes, CodecError> {
        if !self.is_loaded() {
            return Err(CodecError::NotLoaded);
        }
        spec.validate().map_err(|e| CodecError::InvocationFailed {
            label: spec.label.clone(),
            message: e.to_string(),
        })?;

        let workdir = TempDir::new()?;
        let input_path = workdir.path().join("input");
        let output_path = workdir.path().join(&spec.output_name);
        tokio::fs::write(&input_path, &input).await?;

        let start = Instant::now();
        self.run_scale(&input_path, &output_path, spec).await?;

        let output = tokio::fs::read(&output_path).await.map_err(|e| {
            CodecError::InvocationFailed {
                label: spec.label.clone(),
                message: format!("No output produced: {}", e),
            }
        })?;
        if output.is_empty() {
            return Err(CodecError::InvocationFailed {
                label: spec.label.clone(),
                message: "ffmpeg produced an empty output file".to_string(),
            });
        }

        tracing::debug!(
            output_bytes = output.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Resolution transcoded"
        );

        Ok(Bytes::from(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_shell_metacharacters_in_path() {
        assert!(FfmpegRuntime::new("ffmpeg; rm -rf /", Duration::from_secs(1)).is_err());
        assert!(FfmpegRuntime::new("../bin/ffmpeg", Duration::from_secs(1)).is_err());
        assert!(FfmpegRuntime::new("", Duration::from_secs(1)).is_err());
        assert!(FfmpegRuntime::new("/usr/bin/ffmpeg", Duration::from_secs(1)).is_ok());
    }

    #[tokio::test]
    async fn transcode_before_load_fails_fast() {
        let runtime = FfmpegRuntime::new("ffmpeg", Duration::from_secs(1)).unwrap();
        let spec = ResolutionSpec::new("720p", "1280:720");
        let err = runtime
            .transcode(Bytes::from_static(b"video"), &spec)
            .await
            .unwrap_err();
        assert!(matches!(err, CodecError::NotLoaded));
        assert!(!runtime.is_loaded());
    }

    #[test]
    fn stderr_tail_keeps_the_end() {
        let long = "x".repeat(2000) + "real error";
        let tail = stderr_tail(long.as_bytes());
        assert!(tail.starts_with("..."));
        assert!(tail.ends_with("real error"));
        assert_eq!(stderr_tail(b"  short\n"), "short");
    }

    // All process-spawning cases share one test so scripts are never written
    // while another test thread is forking.
    #[cfg(unix)]
    #[tokio::test]
    async fn fake_engine_lifecycle() {
        use std::os::unix::fs::PermissionsExt;

        fn script(dir: &Path, name: &str, body: &str) -> String {
            let path = dir.join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path.display().to_string()
        }

        let dir = tempfile::tempdir().unwrap();
        let spec = ResolutionSpec::new("480p (SD)", "854:480");

        // Missing binary: load fails and the runtime stays unloaded.
        let missing = dir.path().join("no-such-ffmpeg").display().to_string();
        let runtime = FfmpegRuntime::new(missing, Duration::from_secs(5)).unwrap();
        assert!(matches!(
            runtime.ensure_loaded().await,
            Err(CodecError::LoadFailed(_))
        ));
        assert!(!runtime.is_loaded());

        // Working engine: copies input to the output path, prefixed.
        let good = script(
            dir.path(),
            "ffmpeg-good",
            r#"if [ "$1" = "-version" ]; then echo "ffmpeg version 6.1-test Copyright (c) 2000-2024"; exit 0; fi
prev=""; input=""; out=""
for arg in "$@"; do
  if [ "$prev" = "-i" ]; then input="$arg"; fi
  prev="$arg"; out="$arg"
done
{ printf 'scaled:'; cat "$input"; } > "$out""#,
        );
        let runtime = FfmpegRuntime::new(good, Duration::from_secs(5)).unwrap();
        runtime.ensure_loaded().await.unwrap();
        runtime.ensure_loaded().await.unwrap();
        assert!(runtime.is_loaded());
        assert_eq!(runtime.engine_info().unwrap().version, "6.1-test");

        let output = runtime
            .transcode(Bytes::from_static(b"source"), &spec)
            .await
            .unwrap();
        assert_eq!(&output[..], b"scaled:source");

        // Failing engine: non-zero exit surfaces stderr.
        let bad = script(
            dir.path(),
            "ffmpeg-bad",
            r#"if [ "$1" = "-version" ]; then echo "ffmpeg version 6.1-test"; exit 0; fi
echo "Invalid data found when processing input" >&2
exit 1"#,
        );
        let runtime = FfmpegRuntime::new(bad, Duration::from_secs(5)).unwrap();
        runtime.ensure_loaded().await.unwrap();
        match runtime.transcode(Bytes::from_static(b"junk"), &spec).await {
            Err(CodecError::InvocationFailed { label, message }) => {
                assert_eq!(label, "480p (SD)");
                assert!(message.contains("Invalid data"));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        // Hanging engine: bounded by the timeout.
        let slow = script(
            dir.path(),
            "ffmpeg-slow",
            r#"if [ "$1" = "-version" ]; then echo "ffmpeg version 6.1-test"; exit 0; fi
sleep 5"#,
        );
        let runtime = FfmpegRuntime::new(slow, Duration::from_millis(200)).unwrap();
        runtime.ensure_loaded().await.unwrap();
        assert!(matches!(
            runtime.transcode(Bytes::from_static(b"clip"), &spec).await,
            Err(CodecError::Timeout { .. })
        ));
    }
}
