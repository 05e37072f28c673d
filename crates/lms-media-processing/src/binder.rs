//! Component asset binder: the authoritative per-component media state.
//!
//! Every applied field write is published on a broadcast channel so the
//! authoring UI can render progress incrementally. The binder does not
//! validate field semantics; intake and the orchestrator own those.

use lms_media_core::{AssetField, ComponentAssetState, ComponentId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A single applied field write.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetEvent {
    pub component_id: ComponentId,
    pub field: AssetField,
}

pub struct AssetBinder {
    components: RwLock<HashMap<ComponentId, ComponentAssetState>>,
    events: broadcast::Sender<AssetEvent>,
}

impl AssetBinder {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            components: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Register a component with defaulted media state. Existing state is kept.
    pub fn create(&self, component_id: &ComponentId) {
        let mut components = self
            .components
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        components.entry(component_id.clone()).or_default();
    }

    /// Drop a component's state, returning it.
    pub fn remove(&self, component_id: &ComponentId) -> Option<ComponentAssetState> {
        self.components
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(component_id)
    }

    pub fn contains(&self, component_id: &ComponentId) -> bool {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(component_id)
    }

    /// Snapshot of one component's state.
    pub fn get(&self, component_id: &ComponentId) -> Option<ComponentAssetState> {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(component_id)
            .cloned()
    }

    /// Set exactly one field on the addressed component.
    ///
    /// Returns `false` (and publishes nothing) when the component is unknown,
    /// e.g. because it was deleted while a run was still in flight.
    pub fn set_field(&self, component_id: &ComponentId, field: AssetField) -> bool {
        {
            let mut components = self
                .components
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let Some(state) = components.get_mut(component_id) else {
                tracing::debug!(
                    component_id = %component_id,
                    field = field.name(),
                    "Ignoring field write for unknown component"
                );
                return false;
            };
            field.clone().apply(state);
        }

        tracing::trace!(component_id = %component_id, field = field.name(), "Asset field set");

        // No receivers is fine: nobody is rendering this session.
        let _ = self.events.send(AssetEvent {
            component_id: component_id.clone(),
            field,
        });
        true
    }

    /// Subscribe to every subsequent field write.
    pub fn subscribe(&self) -> broadcast::Receiver<AssetEvent> {
        self.events.subscribe()
    }
}

impl Default for AssetBinder {
    fn default() -> Self {
        Self::new()
    }
}
