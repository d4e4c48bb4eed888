//! Transform node storage
//!
//! A [`TransformNode`] is one slot of the tree arena. All of its mutable
//! state sits behind a single coarse mutex; the tree decides how long that
//! lock is held (one cache access at a time).

use parking_lot::Mutex;

use super::composition::{compose_with, ComposeFn, CompositionOrder};
use super::events::{MatrixListener, SubscriptionId};
use super::matrix_cache::MatrixCache;
use crate::foundation::collections::NodeId;
use crate::foundation::math::{try_invert, Mat4, Quat, Vec3};
use crate::scene::EntityId;

/// Result of a non-failing inversion
///
/// When the source matrix is singular `matrix` is the identity and
/// `invertible` is `false`, so per-frame callers never see a plausible but
/// wrong inverse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseMatrix {
    /// Inverse, or identity on failure
    pub matrix: Mat4,
    /// Whether the inversion succeeded
    pub invertible: bool,
}

impl InverseMatrix {
    /// Invert `matrix`, falling back to identity
    pub fn of(matrix: &Mat4) -> Self {
        match try_invert(matrix) {
            Some(inverse) => Self {
                matrix: inverse,
                invertible: true,
            },
            None => Self {
                matrix: Mat4::identity(),
                invertible: false,
            },
        }
    }
}

/// Recompute counters of the four caches of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Local matrix recomputes
    pub local: u64,
    /// World matrix recomputes
    pub world: u64,
    /// Inverse-local recomputes
    pub inverse_local: u64,
    /// Inverse-world recomputes
    pub inverse_world: u64,
}

/// Arena slot of the transform tree
pub struct TransformNode {
    pub(crate) state: Mutex<NodeState>,
}

impl TransformNode {
    pub(crate) fn new(owner: EntityId, parent: Option<NodeId>) -> Self {
        Self {
            state: Mutex::new(NodeState::new(owner, parent)),
        }
    }
}

pub(crate) struct NodeState {
    pub(crate) owner: EntityId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) scale: Vec3,
    pub(crate) translation: Vec3,
    pub(crate) rotation: Quat,
    order: CompositionOrder,
    compose: ComposeFn,
    local: MatrixCache,
    pub(crate) world: MatrixCache,
    inverse_local: MatrixCache<InverseMatrix>,
    inverse_world: MatrixCache<InverseMatrix>,
    pub(crate) listeners: Vec<(SubscriptionId, MatrixListener)>,
}

impl NodeState {
    fn new(owner: EntityId, parent: Option<NodeId>) -> Self {
        let order = CompositionOrder::default();
        let placeholder = InverseMatrix {
            matrix: Mat4::identity(),
            invertible: true,
        };
        Self {
            owner,
            parent,
            children: Vec::new(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            order,
            compose: order.composer(),
            local: MatrixCache::default(),
            world: MatrixCache::default(),
            inverse_local: MatrixCache::new(placeholder),
            inverse_world: MatrixCache::new(placeholder),
            listeners: Vec::new(),
        }
    }

    pub(crate) fn order(&self) -> CompositionOrder {
        self.order
    }

    pub(crate) fn set_order(&mut self, order: CompositionOrder) {
        self.order = order;
        self.compose = order.composer();
    }

    pub(crate) fn local_matrix(&mut self) -> Mat4 {
        let (scale, rotation, translation) = (self.scale, self.rotation, self.translation);
        let compose = self.compose;
        self.local
            .get_or_update(|| compose_with(compose, &scale, &rotation, &translation))
    }

    pub(crate) fn inverse_local(&mut self) -> InverseMatrix {
        let local = self.local_matrix();
        self.inverse_local.get_or_update(|| InverseMatrix::of(&local))
    }

    /// Inverse of an already resolved world matrix
    pub(crate) fn inverse_world(&mut self, world: &Mat4) -> InverseMatrix {
        self.inverse_world.get_or_update(|| InverseMatrix::of(world))
    }

    pub(crate) fn mark_local_dirty(&mut self) {
        self.local.mark_dirty();
        self.inverse_local.mark_dirty();
    }

    pub(crate) fn mark_world_dirty(&mut self) {
        self.world.mark_dirty();
        self.inverse_world.mark_dirty();
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            local: self.local.recompute_count(),
            world: self.world.recompute_count(),
            inverse_local: self.inverse_local.recompute_count(),
            inverse_world: self.inverse_world.recompute_count(),
        }
    }
}
