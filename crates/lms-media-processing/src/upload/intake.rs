use std::sync::Arc;
use std::time::Instant;

use lms_media_core::{AssetField, AssetKind, ComponentId, MediaError, MediaResult, SourceAsset};
use lms_media_storage::{ObjectUploader, UploadRequest};

use crate::binder::AssetBinder;
use crate::notify::{log_media_error, Notice, NoticeKind, Notifier};
use crate::staging::StagingArea;
use crate::validator::UploadValidator;

/// Result of a successful intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeOutcome {
    pub url: String,
    pub kind: AssetKind,
    /// Whether the bytes were staged for transcoding.
    pub staged: bool,
}

/// Accepts author-chosen files and routes them to storage.
///
/// Videos go to `videos/raw` and are staged for the orchestrator; everything
/// else goes to `attachments`. `isUploading` is cleared on every exit path.
///
/// Only the upload flag and `fileUrl` are written here. Clearing variants of
/// a replaced video is [`TranscodeOrchestrator::reset`](crate::video::TranscodeOrchestrator::reset).
pub struct FileIntake {
    uploader: Arc<dyn ObjectUploader>,
    binder: Arc<AssetBinder>,
    staging: Arc<StagingArea>,
    notifier: Arc<dyn Notifier>,
    validator: UploadValidator,
}

impl FileIntake {
    pub fn new(
        uploader: Arc<dyn ObjectUploader>,
        binder: Arc<AssetBinder>,
        staging: Arc<StagingArea>,
        notifier: Arc<dyn Notifier>,
        validator: UploadValidator,
    ) -> Self {
        Self {
            uploader,
            binder,
            staging,
            notifier,
            validator,
        }
    }

    #[tracing::instrument(
        skip(self, asset),
        fields(
            component_id = %component_id,
            file_name = %asset.file_name(),
            size_bytes = asset.size(),
        )
    )]
    pub async fn intake(
        &self,
        component_id: &ComponentId,
        asset: SourceAsset,
    ) -> MediaResult<IntakeOutcome> {
        self.binder
            .set_field(component_id, AssetField::IsUploading(true));

        let result = self.route(component_id, asset).await;

        self.binder
            .set_field(component_id, AssetField::IsUploading(false));

        if let Err(err) = &result {
            log_media_error(component_id, "intake", err);
            self.notifier.notify(Notice::from_error(
                component_id,
                NoticeKind::UploadFailed,
                err,
            ));
        }

        result
    }

    async fn route(
        &self,
        component_id: &ComponentId,
        asset: SourceAsset,
    ) -> MediaResult<IntakeOutcome> {
        self.validator.validate(&asset).map_err(MediaError::from)?;

        let kind = asset.kind();
        let folder = kind.intake_folder();
        let start = Instant::now();

        let outcome = self
            .uploader
            .upload(UploadRequest::new(
                asset.data().clone(),
                asset.content_type(),
                asset.file_name(),
                folder,
            ))
            .await?;

        tracing::info!(
            kind = %kind,
            folder,
            url = %outcome.url,
            duration_ms = start.elapsed().as_millis() as u64,
            "File uploaded"
        );

        if !self
            .binder
            .set_field(component_id, AssetField::FileUrl(Some(outcome.url.clone())))
        {
            return Err(removed_during_upload(component_id));
        }

        let staged = kind == AssetKind::Video;
        if staged {
            self.staging.stage(component_id, asset);
            // Deleted between the URL write and staging.
            if !self.binder.contains(component_id) {
                self.staging.discard(component_id);
                return Err(removed_during_upload(component_id));
            }
        }

        Ok(IntakeOutcome {
            url: outcome.url,
            kind,
            staged,
        })
    }
}

fn removed_during_upload(component_id: &ComponentId) -> MediaError {
    MediaError::PreconditionNotMet(format!(
        "Component {} was removed during upload",
        component_id
    ))
}
