//! Session-scoped staging of raw video files awaiting transcoding.
//!
//! Intake is the only writer; the orchestrator only reads. One file per
//! component: staging again for the same component replaces the previous file.

use chrono::{DateTime, Utc};
use lms_media_core::{ComponentId, SourceAsset};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone)]
pub struct StagedAsset {
    pub asset: SourceAsset,
    pub staged_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct StagingArea {
    files: Mutex<HashMap<ComponentId, StagedAsset>>,
}

impl StagingArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `asset` for `component_id`, returning the file it replaced.
    pub fn stage(&self, component_id: &ComponentId, asset: SourceAsset) -> Option<StagedAsset> {
        let size_bytes = asset.size();
        let previous = self
            .files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                component_id.clone(),
                StagedAsset {
                    asset,
                    staged_at: Utc::now(),
                },
            );

        tracing::debug!(
            component_id = %component_id,
            size_bytes,
            replaced = previous.is_some(),
            "Source video staged"
        );
        previous
    }

    /// The staged file for `component_id`, if any.
    pub fn get(&self, component_id: &ComponentId) -> Option<SourceAsset> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(component_id)
            .map(|staged| staged.asset.clone())
    }

    pub fn staged_at(&self, component_id: &ComponentId) -> Option<DateTime<Utc>> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(component_id)
            .map(|staged| staged.staged_at)
    }

    pub fn discard(&self, component_id: &ComponentId) -> Option<StagedAsset> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(component_id)
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently held in memory across all components.
    pub fn total_bytes(&self) -> u64 {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|staged| staged.asset.size())
            .sum()
    }
}
