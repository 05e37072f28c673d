//! Shared fakes for processing integration tests.
//!
//! Run from workspace root: `cargo test -p lms-media-processing`.

#![allow(dead_code)]

pub mod codec;
pub mod notify;
pub mod storage;

use std::sync::Arc;

use lms_media_core::{ComponentId, ResolutionSpec, SourceAsset};
use lms_media_processing::{AuthoringSession, UploadValidator};

pub use codec::FakeCodec;
pub use notify::RecordingNotifier;
pub use storage::{MemoryUploader, UploadFailure};

pub const MB: usize = 1024 * 1024;

/// Session plus handles on its fakes.
pub struct TestSession {
    pub session: Arc<AuthoringSession>,
    pub codec: Arc<FakeCodec>,
    pub uploader: Arc<MemoryUploader>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn default_specs() -> Vec<ResolutionSpec> {
    vec![
        ResolutionSpec::new("720p", "1280:720"),
        ResolutionSpec::new("480p (SD)", "854:480"),
    ]
}

pub fn session_with(codec: FakeCodec, uploader: MemoryUploader) -> TestSession {
    let codec = Arc::new(codec);
    let uploader = Arc::new(uploader);
    let notifier = Arc::new(RecordingNotifier::default());
    let session = AuthoringSession::new(
        codec.clone(),
        uploader.clone(),
        notifier.clone(),
        UploadValidator::new(100 * MB as u64, 10 * MB as u64),
        default_specs(),
    );
    TestSession {
        session: Arc::new(session),
        codec,
        uploader,
        notifier,
    }
}

pub fn session() -> TestSession {
    session_with(FakeCodec::default(), MemoryUploader::default())
}

pub fn video(size: usize) -> SourceAsset {
    SourceAsset::new(vec![0x42u8; size], "video/mp4", "lecture.mp4")
}

pub fn pdf(size: usize) -> SourceAsset {
    SourceAsset::new(vec![0x25u8; size], "application/pdf", "syllabus.pdf")
}

/// Open a component and upload a staged video for it.
pub async fn staged_component(test: &TestSession, id: &str, size: usize) -> ComponentId {
    let component_id = ComponentId::from(id);
    test.session.open_component(&component_id);
    test.session
        .intake(&component_id, video(size))
        .await
        .expect("intake should succeed");
    component_id
}
