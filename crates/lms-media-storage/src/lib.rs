//! Course media storage library
//!
//! This crate provides the upload abstraction used by the media pipeline:
//! the [`ObjectUploader`] trait, an HTTP multipart backend, a local
//! filesystem backend and a retry decorator.
//!
//! # Storage key format
//!
//! Uploads are addressed by a destination folder hint (`videos/raw`,
//! `attachments`, `videos/720p`, ...). Backends that choose their own keys
//! use `{folder}/{uuid}-{sanitized file name}`; key generation lives in the
//! `keys` module so all backends stay consistent.

pub mod factory;
#[cfg(feature = "storage-local")]
pub(crate) mod keys;
#[cfg(feature = "storage-http")]
pub mod http;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod retry;
pub mod traits;

// Re-export commonly used types
pub use factory::create_uploader;
#[cfg(feature = "storage-http")]
pub use http::HttpUploader;
pub use lms_media_core::UploadBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalUploader;
pub use retry::{RetryPolicy, RetryingUploader};
pub use traits::{ObjectUploader, UploadError, UploadRequest, UploadResult};
