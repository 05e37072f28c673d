//! User-visible failure notifications.
//!
//! Intake and the orchestrator convert every failure into a [`Notice`] at
//! their boundary; the embedding UI decides how to present it.

use lms_media_core::{ComponentId, ErrorMetadata, LogLevel, MediaError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    UploadFailed,
    TranscodeFailed,
    TranscodeCancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub component_id: ComponentId,
    pub kind: NoticeKind,
    pub code: &'static str,
    pub message: String,
}

impl Notice {
    pub fn from_error(component_id: &ComponentId, kind: NoticeKind, err: &MediaError) -> Self {
        Self {
            component_id: component_id.clone(),
            kind,
            code: err.error_code(),
            message: err.client_message(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        tracing::warn!(
            component_id = %notice.component_id,
            kind = ?notice.kind,
            code = notice.code,
            message = %notice.message,
            "Media notice"
        );
    }
}

/// Log `err` at the level its metadata asks for.
pub(crate) fn log_media_error(component_id: &ComponentId, operation: &str, err: &MediaError) {
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(
            component_id = %component_id,
            operation,
            code = err.error_code(),
            error = %err,
            "Media operation failed"
        ),
        LogLevel::Warn => tracing::warn!(
            component_id = %component_id,
            operation,
            code = err.error_code(),
            error = %err,
            "Media operation failed"
        ),
        LogLevel::Error => tracing::error!(
            component_id = %component_id,
            operation,
            code = err.error_code(),
            error = %err,
            "Media operation failed"
        ),
    }
}
