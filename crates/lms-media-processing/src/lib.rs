//! Course media processing library
//!
//! Raw file intake, the codec runtime and the transcoding orchestrator that
//! derives resolution variants of course videos, plus the per-component
//! state binder the authoring UI observes.

pub mod binder;
pub mod notify;
pub mod session;
pub mod staging;
pub mod upload;
pub mod validator;
pub mod video;

// Re-export commonly used types
pub use binder::{AssetBinder, AssetEvent};
pub use notify::{LogNotifier, Notice, NoticeKind, Notifier};
pub use session::AuthoringSession;
pub use staging::{StagedAsset, StagingArea};
pub use upload::{FileIntake, IntakeOutcome};
pub use validator::{UploadValidator, ValidationError};
pub use video::{
    CodecError, CodecGate, CodecRuntime, EngineInfo, FfmpegRuntime, RunState,
    TranscodeOrchestrator,
};
