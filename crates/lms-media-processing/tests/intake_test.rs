//! Raw file intake integration tests.

mod helpers;

use std::time::Duration;

use helpers::{pdf, session, session_with, video, FakeCodec, MemoryUploader, UploadFailure, MB};
use lms_media_core::{AssetField, AssetKind, ComponentId, ErrorMetadata, MediaError};
use lms_media_processing::NoticeKind;

#[tokio::test]
async fn video_goes_to_raw_folder_and_is_staged() {
    let test = session();
    let id = ComponentId::from("video-component");
    test.session.open_component(&id);

    let outcome = test.session.intake(&id, video(MB)).await.unwrap();

    assert_eq!(outcome.kind, AssetKind::Video);
    assert!(outcome.staged);
    assert_eq!(test.uploader.folders(), ["videos/raw"]);
    assert_eq!(test.session.staging().get(&id).unwrap().size(), MB as u64);

    let state = test.session.state(&id).unwrap();
    assert_eq!(state.file_url.as_deref(), Some(outcome.url.as_str()));
    assert!(!state.is_uploading);
}

#[tokio::test]
async fn pdf_goes_to_attachments_and_is_not_staged() {
    let test = session();
    let id = ComponentId::from("reading");
    test.session.open_component(&id);

    let outcome = test.session.intake(&id, pdf(2048)).await.unwrap();

    assert_eq!(outcome.kind, AssetKind::Attachment);
    assert!(!outcome.staged);
    assert_eq!(test.uploader.folders(), ["attachments"]);
    assert!(test.session.staging().is_empty());

    // Nothing staged, so generating resolutions is a precondition failure.
    let err = test.session.generate_resolutions(&id).await.unwrap_err();
    assert!(matches!(err, MediaError::PreconditionNotMet(_)));
    assert_eq!(err.client_message(), "Please upload a file first");
}

#[tokio::test]
async fn http_500_resets_uploading_and_keeps_file_url() {
    let uploader = MemoryUploader::default();
    uploader.fail_folder("videos/raw", UploadFailure::Status(500));
    let test = session_with(FakeCodec::default(), uploader);
    let id = ComponentId::from("video-component");
    test.session.open_component(&id);
    let mut events = test.session.subscribe();

    let err = test.session.intake(&id, video(4096)).await.unwrap_err();

    assert!(matches!(
        err,
        MediaError::UploadFailed {
            status: Some(500),
            size_bytes: 4096,
            ..
        }
    ));

    let mut fields = Vec::new();
    while let Ok(event) = events.try_recv() {
        fields.push(event.field);
    }
    assert_eq!(
        fields,
        vec![AssetField::IsUploading(true), AssetField::IsUploading(false)]
    );

    let state = test.session.state(&id).unwrap();
    assert!(state.file_url.is_none());
    assert!(!state.is_uploading);
    assert!(test.session.staging().is_empty());
    assert_eq!(test.notifier.kinds(), vec![NoticeKind::UploadFailed]);
}

#[tokio::test]
async fn unreachable_storage_is_reported_like_a_failed_upload() {
    let uploader = MemoryUploader::default();
    uploader.fail_folder("attachments", UploadFailure::Unreachable);
    let test = session_with(FakeCodec::default(), uploader);
    let id = ComponentId::from("reading");
    test.session.open_component(&id);

    let err = test.session.intake(&id, pdf(10)).await.unwrap_err();

    assert!(matches!(err, MediaError::UploadUnreachable { .. }));
    assert_eq!(err.client_message(), "Upload failed. Please retry");
    assert!(!test.session.state(&id).unwrap().is_uploading);
    assert_eq!(test.notifier.notices()[0].code, "UPLOAD_UNREACHABLE");
}

#[tokio::test]
async fn attachment_over_limit_is_rejected() {
    let test = session();
    let id = ComponentId::from("reading");
    test.session.open_component(&id);

    let err = test.session.intake(&id, pdf(11 * MB)).await.unwrap_err();

    assert!(matches!(err, MediaError::FileTooLarge { .. }));
    assert!(test.uploader.folders().is_empty());
    assert!(!test.session.state(&id).unwrap().is_uploading);
}

#[tokio::test]
async fn later_intake_replaces_staged_video() {
    let test = session();
    let id = ComponentId::from("video-component");
    test.session.open_component(&id);

    test.session.intake(&id, video(100)).await.unwrap();
    test.session.intake(&id, video(200)).await.unwrap();

    assert_eq!(test.session.staging().len(), 1);
    assert_eq!(test.session.staging().get(&id).unwrap().size(), 200);
    assert_eq!(test.uploader.folders(), ["videos/raw", "videos/raw"]);
}

#[tokio::test]
async fn deleting_a_component_releases_staged_bytes() {
    let test = session();
    let id = ComponentId::from("video-component");
    test.session.open_component(&id);
    test.session.intake(&id, video(100)).await.unwrap();

    let removed = test.session.delete_component(&id).unwrap();

    assert!(removed.file_url.is_some());
    assert!(test.session.staging().is_empty());
    assert!(test.session.state(&id).is_none());
}

#[tokio::test]
async fn deleting_during_upload_leaves_nothing_staged() {
    let uploader = MemoryUploader::default();
    uploader.delay_folder("videos/raw", Duration::from_millis(50));
    let test = session_with(FakeCodec::default(), uploader);
    let id = ComponentId::from("video-component");
    test.session.open_component(&id);

    let session = test.session.clone();
    let intake_id = id.clone();
    let intake = tokio::spawn(async move { session.intake(&intake_id, video(5 * MB)).await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(test.session.delete_component(&id).is_some());

    let err = intake.await.unwrap().unwrap_err();

    assert!(matches!(err, MediaError::PreconditionNotMet(_)));
    assert!(test.session.state(&id).is_none());
    assert!(test.session.staging().is_empty());
    assert_eq!(test.session.staging().total_bytes(), 0);
    assert_eq!(test.notifier.kinds(), vec![NoticeKind::UploadFailed]);
}

#[tokio::test]
async fn second_intake_is_refused_while_first_is_uploading() {
    let uploader = MemoryUploader::default();
    uploader.delay_folder("videos/raw", Duration::from_millis(50));
    let test = session_with(FakeCodec::default(), uploader);
    let id = ComponentId::from("video-component");
    test.session.open_component(&id);

    let session = test.session.clone();
    let intake_id = id.clone();
    let first = tokio::spawn(async move { session.intake(&intake_id, video(100)).await });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let err = test.session.intake(&id, pdf(10)).await.unwrap_err();
    assert!(matches!(err, MediaError::PreconditionNotMet(_)));

    first.await.unwrap().unwrap();
    assert_eq!(test.uploader.folders(), ["videos/raw"]);
    assert_eq!(test.session.staging().get(&id).unwrap().size(), 100);
    assert!(!test.session.state(&id).unwrap().is_uploading);
}
