//! Resolution orchestration: upload original → transcode each spec → upload → commit.
//!
//! Results are accumulated locally and written to the binder only once every
//! resolution has succeeded, so `resolutions` is either absent or complete.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use lms_media_core::constants::{ORIGINAL_VARIANT_FOLDER, ORIGINAL_VARIANT_LABEL};
use lms_media_core::{
    describe_size, AssetField, ComponentId, MediaError, MediaResult, ResolutionResult,
    ResolutionSpec, SourceAsset,
};
use lms_media_storage::{ObjectUploader, UploadRequest};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::codec::CodecRuntime;
use crate::binder::AssetBinder;
use crate::notify::{log_media_error, Notice, NoticeKind, Notifier};
use crate::staging::StagingArea;

/// Where a component's most recent run stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RunState {
    Idle,
    UploadingOriginal,
    Transcoding { index: usize, label: String },
    Completed,
    Failed { reason: String },
    Cancelled,
}

impl RunState {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RunState::UploadingOriginal | RunState::Transcoding { .. }
        )
    }
}

struct ActiveRun {
    run_id: Uuid,
    cancel: CancellationToken,
}

/// What currently holds a component. At most one of either at a time.
enum Busy {
    Intake,
    Run(ActiveRun),
}

type BusyMap = Mutex<HashMap<ComponentId, Busy>>;

/// A component held for a raw file intake. Released on drop.
///
/// Runs for the component are refused while the claim is alive.
pub struct IntakeClaim<'a> {
    busy: &'a BusyMap,
    component_id: ComponentId,
}

impl Drop for IntakeClaim<'_> {
    fn drop(&mut self) {
        let mut busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(busy.get(&self.component_id), Some(Busy::Intake)) {
            busy.remove(&self.component_id);
        }
    }
}

fn uploading_error() -> MediaError {
    MediaError::PreconditionNotMet(
        "A file is still being uploaded for this component".to_string(),
    )
}

fn running_error() -> MediaError {
    MediaError::PreconditionNotMet("Resolutions are already being generated".to_string())
}

/// Drives transcoding runs, one per component at a time, and owns the
/// orchestrator fields (`transcodingProgress`, `resolutions`) of every
/// component.
///
/// A component is held by either one intake or one run; see
/// [`claim_intake`](Self::claim_intake).
///
/// Codec access is not serialised here; share a [`CodecGate`](super::CodecGate)
/// between orchestrators (or runs) to keep the engine single-flight.
pub struct TranscodeOrchestrator {
    codec: Arc<dyn CodecRuntime>,
    uploader: Arc<dyn ObjectUploader>,
    binder: Arc<AssetBinder>,
    staging: Arc<StagingArea>,
    notifier: Arc<dyn Notifier>,
    specs: Vec<ResolutionSpec>,
    states: Mutex<HashMap<ComponentId, RunState>>,
    busy: BusyMap,
}

impl TranscodeOrchestrator {
    pub fn new(
        codec: Arc<dyn CodecRuntime>,
        uploader: Arc<dyn ObjectUploader>,
        binder: Arc<AssetBinder>,
        staging: Arc<StagingArea>,
        notifier: Arc<dyn Notifier>,
        specs: Vec<ResolutionSpec>,
    ) -> Self {
        Self {
            codec,
            uploader,
            binder,
            staging,
            notifier,
            specs,
            states: Mutex::new(HashMap::new()),
            busy: Mutex::new(HashMap::new()),
        }
    }

    pub fn specs(&self) -> &[ResolutionSpec] {
        &self.specs
    }

    pub fn run_state(&self, component_id: &ComponentId) -> RunState {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(component_id)
            .cloned()
            .unwrap_or(RunState::Idle)
    }

    /// Request cancellation of the component's active run.
    ///
    /// Returns `false` when no run is active.
    pub fn cancel(&self, component_id: &ComponentId) -> bool {
        let busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        match busy.get(component_id) {
            Some(Busy::Run(run)) => {
                tracing::info!(component_id = %component_id, run_id = %run.run_id, "Cancelling transcoding run");
                run.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    /// Hold the component for an intake; fails while a run or another
    /// intake holds it.
    pub fn claim_intake(&self, component_id: &ComponentId) -> MediaResult<IntakeClaim<'_>> {
        let mut busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        match busy.get(component_id) {
            Some(Busy::Run(_)) => Err(MediaError::PreconditionNotMet(
                "Resolutions are being generated for this component".to_string(),
            )),
            Some(Busy::Intake) => Err(uploading_error()),
            None => {
                busy.insert(component_id.clone(), Busy::Intake);
                Ok(IntakeClaim {
                    busy: &self.busy,
                    component_id: component_id.clone(),
                })
            }
        }
    }

    /// Clear the variants and progress derived from a replaced source video.
    ///
    /// Refused while a run for the component is active.
    pub fn reset(&self, component_id: &ComponentId) -> MediaResult<()> {
        let busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(busy.get(component_id), Some(Busy::Run(_))) {
            return Err(running_error());
        }

        self.binder
            .set_field(component_id, AssetField::Resolutions(None));
        self.binder
            .set_field(component_id, AssetField::TranscodingProgress(0));
        self.forget(component_id);
        tracing::debug!(component_id = %component_id, "Transcoding state reset");
        Ok(())
    }

    /// Drop the recorded run state; the component reports `Idle` afterwards.
    pub fn forget(&self, component_id: &ComponentId) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(component_id);
    }

    /// Produce the original plus every configured resolution for the
    /// component's staged video.
    ///
    /// Failures are logged, reported to the notifier and returned; the
    /// component always ends with `isTranscoding = false`.
    #[tracing::instrument(skip(self), fields(component_id = %component_id))]
    pub async fn run(&self, component_id: &ComponentId) -> MediaResult<Vec<ResolutionResult>> {
        let (asset, run_id, cancel) = match self.begin(component_id) {
            Ok(started) => started,
            Err(err) => {
                log_media_error(component_id, "generate_resolutions", &err);
                self.notifier.notify(Notice::from_error(
                    component_id,
                    NoticeKind::TranscodeFailed,
                    &err,
                ));
                return Err(err);
            }
        };

        let start = Instant::now();
        tracing::info!(
            run_id = %run_id,
            size_bytes = asset.size(),
            resolutions = self.specs.len(),
            "Starting transcoding run"
        );

        self.binder
            .set_field(component_id, AssetField::IsTranscoding(true));
        self.binder
            .set_field(component_id, AssetField::TranscodingProgress(0));

        let result = self.execute(component_id, &asset, &cancel).await;

        self.binder
            .set_field(component_id, AssetField::IsTranscoding(false));

        match &result {
            Ok(results) => {
                self.binder.set_field(
                    component_id,
                    AssetField::Resolutions(Some(results.clone())),
                );
                if let Some(original) = results.first() {
                    self.binder
                        .set_field(component_id, AssetField::FileUrl(Some(original.url.clone())));
                }
                self.set_state(component_id, RunState::Completed);
                tracing::info!(
                    run_id = %run_id,
                    resolutions = results.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Transcoding run completed"
                );
            }
            Err(err) => {
                self.binder
                    .set_field(component_id, AssetField::TranscodingProgress(0));

                let (state, kind) = match err {
                    MediaError::Cancelled => (RunState::Cancelled, NoticeKind::TranscodeCancelled),
                    other => (
                        RunState::Failed {
                            reason: other.to_string(),
                        },
                        NoticeKind::TranscodeFailed,
                    ),
                };
                self.set_state(component_id, state);
                log_media_error(component_id, "generate_resolutions", err);
                self.notifier
                    .notify(Notice::from_error(component_id, kind, err));
            }
        }

        self.finish(component_id, run_id);
        result
    }

    /// Check preconditions and register the run. Mutates nothing on failure.
    fn begin(
        &self,
        component_id: &ComponentId,
    ) -> MediaResult<(SourceAsset, Uuid, CancellationToken)> {
        let asset = self
            .staging
            .get(component_id)
            .ok_or_else(MediaError::nothing_staged)?;

        if !self.codec.is_loaded() {
            return Err(MediaError::PreconditionNotMet(
                "Codec engine is not ready".to_string(),
            ));
        }

        let state = self.binder.get(component_id).ok_or_else(|| {
            MediaError::PreconditionNotMet(format!("Unknown component {}", component_id))
        })?;
        if state.resolutions.is_some() {
            return Err(MediaError::PreconditionNotMet(
                "Resolutions have already been generated".to_string(),
            ));
        }
        if state.is_uploading {
            return Err(uploading_error());
        }

        let mut busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        match busy.get(component_id) {
            Some(Busy::Intake) => return Err(uploading_error()),
            Some(Busy::Run(_)) => return Err(running_error()),
            None if state.is_transcoding => return Err(running_error()),
            None => {}
        }

        let run_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        busy.insert(
            component_id.clone(),
            Busy::Run(ActiveRun {
                run_id,
                cancel: cancel.clone(),
            }),
        );
        drop(busy);

        self.set_state(component_id, RunState::UploadingOriginal);
        Ok((asset, run_id, cancel))
    }

    fn finish(&self, component_id: &ComponentId, run_id: Uuid) {
        let mut busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(busy.get(component_id), Some(Busy::Run(run)) if run.run_id == run_id) {
            busy.remove(component_id);
        }
    }

    /// Record the run state of a component the binder still knows.
    fn set_state(&self, component_id: &ComponentId, state: RunState) {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        if self.binder.contains(component_id) {
            states.insert(component_id.clone(), state);
        } else {
            states.remove(component_id);
        }
    }

    async fn execute(
        &self,
        component_id: &ComponentId,
        asset: &SourceAsset,
        cancel: &CancellationToken,
    ) -> MediaResult<Vec<ResolutionResult>> {
        let mut results = Vec::with_capacity(self.specs.len() + 1);

        let original = until_cancelled(
            cancel,
            self.upload(
                asset.data().clone(),
                asset.content_type(),
                asset.file_name(),
                ORIGINAL_VARIANT_FOLDER,
            ),
        )
        .await?;
        tracing::debug!(label = ORIGINAL_VARIANT_LABEL, url = %original, "Original uploaded");
        results.push(ResolutionResult {
            label: ORIGINAL_VARIANT_LABEL.to_string(),
            url: original,
            size_description: describe_size(asset.size()),
        });

        let total = self.specs.len();
        for (index, spec) in self.specs.iter().enumerate() {
            self.set_state(
                component_id,
                RunState::Transcoding {
                    index,
                    label: spec.label.clone(),
                },
            );

            let output = until_cancelled(cancel, async {
                self.codec
                    .transcode(asset.data().clone(), spec)
                    .await
                    .map_err(MediaError::from)
            })
            .await?;
            let size_bytes = output.len() as u64;

            let url = until_cancelled(
                cancel,
                self.upload(
                    output,
                    spec.output_content_type(),
                    &spec.output_name,
                    &spec.folder(),
                ),
            )
            .await?;

            tracing::debug!(label = %spec.label, url = %url, size_bytes, "Resolution uploaded");
            results.push(ResolutionResult {
                label: spec.label.clone(),
                url,
                size_description: describe_size(size_bytes),
            });

            self.binder.set_field(
                component_id,
                AssetField::TranscodingProgress(progress_percent(index, total)),
            );
        }

        Ok(results)
    }

    async fn upload(
        &self,
        data: bytes::Bytes,
        content_type: &str,
        file_name: &str,
        folder: &str,
    ) -> MediaResult<String> {
        let outcome = self
            .uploader
            .upload(UploadRequest::new(data, content_type, file_name, folder))
            .await?;
        Ok(outcome.url)
    }
}

/// `round((index + 1) / total * 100)` in integer arithmetic.
fn progress_percent(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = ((index + 1) * 100 + total / 2) / total;
    percent.min(100) as u8
}

async fn until_cancelled<T, F>(cancel: &CancellationToken, fut: F) -> MediaResult<T>
where
    F: Future<Output = MediaResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(MediaError::Cancelled),
        result = fut => result,
    }
}
