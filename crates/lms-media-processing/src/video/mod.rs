//! Video transcoding: codec runtime, codec gate and the resolution orchestrator

pub mod codec;
pub mod ffmpeg;
pub mod gate;
pub mod orchestration;

pub use codec::{CodecError, CodecRuntime};
pub use ffmpeg::{EngineInfo, FfmpegRuntime};
pub use gate::CodecGate;
pub use orchestration::{IntakeClaim, RunState, TranscodeOrchestrator};
