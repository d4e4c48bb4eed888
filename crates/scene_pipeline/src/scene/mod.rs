//! Scene support for the render pipeline
//!
//! Provides the pieces the pipeline core plugs into:
//! - Bounding volumes and frustum extraction for culling
//! - A pluggable spatial index (linear reference implementation)
//! - The visual scene that owns an index and tracks visible render infos

mod bounds;
mod spatial_index;
mod visual_scene;

pub use bounds::{AABB, BoundingSphere, CullingVolume, Frustum, Plane, Rect};
pub use spatial_index::{SimpleListIndex, SpatialIndex};
pub use visual_scene::VisualScene;

/// Identifier of the scene entity that owns transforms and render infos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    id: u32,
}

impl EntityId {
    /// Create an entity id
    pub fn new(id: u32) -> Self {
        Self { id }
    }

    /// Get the raw id
    pub fn id(&self) -> u32 {
        self.id
    }
}
