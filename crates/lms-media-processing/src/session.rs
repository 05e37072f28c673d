//! Authoring session: everything one curriculum-editing page owns.

use std::sync::Arc;

use lms_media_core::{
    AssetField, ComponentAssetState, ComponentId, MediaError, MediaResult,
    ResolutionResult, ResolutionSpec, SourceAsset,
};
use lms_media_storage::ObjectUploader;
use tokio::sync::broadcast;

use crate::binder::{AssetBinder, AssetEvent};
use crate::notify::{log_media_error, Notice, NoticeKind, Notifier};
use crate::staging::StagingArea;
use crate::upload::{FileIntake, IntakeOutcome};
use crate::validator::UploadValidator;
use crate::video::{CodecGate, CodecRuntime, RunState, TranscodeOrchestrator};

/// Binder, staging area, intake and orchestrator for one authoring session.
///
/// The codec runtime is wrapped in a [`CodecGate`] so that runs for
/// different components never invoke it concurrently.
pub struct AuthoringSession {
    binder: Arc<AssetBinder>,
    staging: Arc<StagingArea>,
    codec: Arc<dyn CodecRuntime>,
    notifier: Arc<dyn Notifier>,
    intake: FileIntake,
    orchestrator: TranscodeOrchestrator,
}

impl AuthoringSession {
    pub fn new(
        codec: Arc<dyn CodecRuntime>,
        uploader: Arc<dyn ObjectUploader>,
        notifier: Arc<dyn Notifier>,
        validator: UploadValidator,
        specs: Vec<ResolutionSpec>,
    ) -> Self {
        let binder = Arc::new(AssetBinder::new());
        let staging = Arc::new(StagingArea::new());
        let codec: Arc<dyn CodecRuntime> = Arc::new(CodecGate::new(codec));

        let intake = FileIntake::new(
            uploader.clone(),
            binder.clone(),
            staging.clone(),
            notifier.clone(),
            validator,
        );
        let orchestrator = TranscodeOrchestrator::new(
            codec.clone(),
            uploader,
            binder.clone(),
            staging.clone(),
            notifier.clone(),
            specs,
        );

        Self {
            binder,
            staging,
            codec,
            notifier,
            intake,
            orchestrator,
        }
    }

    pub fn open_component(&self, component_id: &ComponentId) {
        self.binder.create(component_id);
    }

    /// Drop a component: cancels its run and releases its staged bytes and
    /// run state.
    ///
    /// The binder entry is removed before the staged bytes are discarded;
    /// an intake finishing concurrently re-checks the binder after staging.
    pub fn delete_component(&self, component_id: &ComponentId) -> Option<ComponentAssetState> {
        self.orchestrator.cancel(component_id);
        let removed = self.binder.remove(component_id);
        self.staging.discard(component_id);
        self.orchestrator.forget(component_id);
        removed
    }

    /// Write a curriculum field (title, content, ...) on a component.
    pub fn set_field(&self, component_id: &ComponentId, field: AssetField) -> bool {
        self.binder.set_field(component_id, field)
    }

    /// Upload a file for the component.
    ///
    /// The component is held for the whole intake, so no run can start
    /// until the new video is staged and its stale variants are cleared.
    pub async fn intake(
        &self,
        component_id: &ComponentId,
        asset: SourceAsset,
    ) -> MediaResult<IntakeOutcome> {
        let _claim = match self.orchestrator.claim_intake(component_id) {
            Ok(claim) => claim,
            Err(err) => {
                self.report(component_id, NoticeKind::UploadFailed, "intake", &err);
                return Err(err);
            }
        };

        let outcome = self.intake.intake(component_id, asset).await?;
        if outcome.staged {
            if let Err(err) = self.orchestrator.reset(component_id) {
                self.report(component_id, NoticeKind::UploadFailed, "intake", &err);
                return Err(err);
            }
        }
        Ok(outcome)
    }

    /// Load the codec runtime ahead of the first run.
    pub async fn prepare_codec(&self) -> MediaResult<()> {
        self.codec.ensure_loaded().await.map_err(MediaError::from)
    }

    pub fn codec_ready(&self) -> bool {
        self.codec.is_loaded()
    }

    /// Load the codec if needed, then run the orchestrator for the component.
    pub async fn generate_resolutions(
        &self,
        component_id: &ComponentId,
    ) -> MediaResult<Vec<ResolutionResult>> {
        if self.staging.get(component_id).is_some() {
            if let Err(err) = self.prepare_codec().await {
                self.report(
                    component_id,
                    NoticeKind::TranscodeFailed,
                    "generate_resolutions",
                    &err,
                );
                return Err(err);
            }
        }
        self.orchestrator.run(component_id).await
    }

    pub fn cancel(&self, component_id: &ComponentId) -> bool {
        self.orchestrator.cancel(component_id)
    }

    pub fn state(&self, component_id: &ComponentId) -> Option<ComponentAssetState> {
        self.binder.get(component_id)
    }

    pub fn run_state(&self, component_id: &ComponentId) -> RunState {
        self.orchestrator.run_state(component_id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AssetEvent> {
        self.binder.subscribe()
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    fn report(
        &self,
        component_id: &ComponentId,
        kind: NoticeKind,
        operation: &str,
        err: &MediaError,
    ) {
        log_media_error(component_id, operation, err);
        self.notifier
            .notify(Notice::from_error(component_id, kind, err));
    }
}
