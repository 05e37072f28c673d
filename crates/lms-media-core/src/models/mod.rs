//! Domain models for the course media pipeline.

pub mod asset;
pub mod component;
pub mod resolution;

pub use asset::{AssetKind, SourceAsset, UploadOutcome};
pub use component::{AssetField, ComponentAssetState, ComponentId};
pub use resolution::{describe_size, parse_resolution_specs, ResolutionResult, ResolutionSpec};
