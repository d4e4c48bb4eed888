//! Visual scene: the owner of a spatial index
//!
//! Render infos hold an `Arc<VisualScene>` back-reference and keep their
//! membership in its index in sync with their visibility. The frame driver
//! queries the scene for the ids to collect each frame.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::bounds::CullingVolume;
use super::spatial_index::{SimpleListIndex, SpatialIndex};
use crate::render::RenderInfoId;

/// Named world that render infos register into
pub struct VisualScene {
    name: String,
    index: Mutex<Box<dyn SpatialIndex>>,
}

impl VisualScene {
    /// Create a scene backed by a [`SimpleListIndex`]
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::with_index(name, Box::new(SimpleListIndex::new()))
    }

    /// Create a scene backed by a custom spatial index
    pub fn with_index(name: impl Into<String>, index: Box<dyn SpatialIndex>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            index: Mutex::new(index),
        })
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ids of registered render infos whose volume meets `camera_volume`
    pub fn query_visible(&self, camera_volume: Option<&CullingVolume>) -> Vec<RenderInfoId> {
        self.index.lock().query_visible(camera_volume)
    }

    /// Whether a render info is currently registered
    pub fn is_registered(&self, id: RenderInfoId) -> bool {
        self.index.lock().contains(id)
    }

    /// Number of registered render infos
    pub fn registered_count(&self) -> usize {
        self.index.lock().len()
    }

    pub(crate) fn register(&self, id: RenderInfoId, volume: Option<CullingVolume>) {
        log::trace!("Scene '{}': register {:?}", self.name, id);
        self.index.lock().add(id, volume);
    }

    pub(crate) fn unregister(&self, id: RenderInfoId) {
        log::trace!("Scene '{}': unregister {:?}", self.name, id);
        self.index.lock().remove(id);
    }

    pub(crate) fn update_volume(&self, id: RenderInfoId, volume: Option<CullingVolume>) {
        self.index.lock().update(id, volume);
    }
}

impl fmt::Debug for VisualScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisualScene")
            .field("name", &self.name)
            .field("registered", &self.registered_count())
            .finish()
    }
}
