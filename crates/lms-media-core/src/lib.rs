//! Course media core library
//!
//! Domain models, error types and configuration shared by the storage,
//! processing and CLI crates of the course media pipeline.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{CodecConfig, IntakeConfig, MediaConfig, StorageConfig};
pub use error::{ErrorMetadata, LogLevel, MediaError, MediaResult};
pub use models::{
    describe_size, AssetField, AssetKind, ComponentAssetState, ComponentId, ResolutionResult,
    ResolutionSpec, SourceAsset, UploadOutcome,
};
pub use storage_types::UploadBackend;
