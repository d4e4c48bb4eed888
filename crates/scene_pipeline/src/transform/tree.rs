//! Transform hierarchy with lazily cached matrices
//!
//! Nodes live in a slotmap arena and are addressed by [`NodeId`]. A node owns
//! its children (removing a node removes its subtree) and refers to its
//! parent by id only, so there are no shared mutable back-pointers.
//!
//! ## Locking
//!
//! - The arena is behind an `RwLock`. Structural changes (create, remove,
//!   reparent) take it exclusively; every other operation shares it.
//! - Each node has one coarse mutex held for a single cache access.
//! - Invalidation re-locks node by node and never holds two node locks.
//! - A lazy world read walks up to the nearest clean ancestor one lock at a
//!   time, then recomputes downward hand over hand: the parent stays locked
//!   while its child stores a world built from it. Locks are only ever
//!   nested ancestor-then-child, two at a time.
//! - If an invalidation lands between the walk and the recompute, the
//!   read starts over.
//!
//! Independent subtrees can therefore be read and invalidated concurrently.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{MutexGuard, RwLock, RwLockWriteGuard};

use super::composition::CompositionOrder;
use super::error::TransformError;
use super::events::{MatrixChanged, MatrixKind, PendingNotifications, SubscriptionId};
use super::node::{CacheStats, InverseMatrix, NodeState, TransformNode};
use crate::foundation::collections::{NodeId, NodeMap};
use crate::foundation::math::{Mat4, Quat, Vec3};
use crate::scene::EntityId;

/// Result alias for transform operations
pub type TransformResult<T> = Result<T, TransformError>;

/// Arena-backed transform hierarchy, shareable across threads
pub struct TransformTree {
    nodes: RwLock<NodeMap<TransformNode>>,
    next_subscription: AtomicU64,
}

impl TransformTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty tree with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: RwLock::new(NodeMap::with_capacity_and_key(capacity)),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Whether the tree has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Whether `id` names a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.read().contains_key(id)
    }

    /// All nodes without a parent
    pub fn roots(&self) -> Vec<NodeId> {
        let nodes = self.nodes.read();
        nodes
            .iter()
            .filter(|(_, node)| node.state.lock().parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Create a node owned by `owner`, optionally attached under `parent`
    pub fn create_node(&self, owner: EntityId, parent: Option<NodeId>) -> TransformResult<NodeId> {
        let mut nodes = self.nodes.write();
        if let Some(parent_id) = parent {
            if !nodes.contains_key(parent_id) {
                return Err(TransformError::NodeNotFound(parent_id));
            }
        }

        let id = nodes.insert(TransformNode::new(owner, parent));
        if let Some(parent_id) = parent {
            if let Some(parent_node) = nodes.get_mut(parent_id) {
                parent_node.state.get_mut().children.push(id);
            }
        }

        log::debug!("Created transform node {:?} for {:?} (parent {:?})", id, owner, parent);
        Ok(id)
    }

    /// Remove a node together with its whole subtree
    ///
    /// Returns the number of nodes removed.
    pub fn remove_node(&self, id: NodeId) -> TransformResult<usize> {
        let mut nodes = self.nodes.write();
        let parent = nodes
            .get_mut(id)
            .ok_or(TransformError::NodeNotFound(id))?
            .state
            .get_mut()
            .parent;

        if let Some(parent_id) = parent {
            if let Some(parent_node) = nodes.get_mut(parent_id) {
                parent_node.state.get_mut().children.retain(|child| *child != id);
            }
        }

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = nodes.remove(current) {
                stack.extend(node.state.into_inner().children);
                removed += 1;
            }
        }

        log::debug!("Removed transform node {:?} and {} descendant(s)", id, removed - 1);
        Ok(removed)
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> TransformResult<Option<NodeId>> {
        self.read_state(id, |state| state.parent)
    }

    /// Children of a node, in attachment order
    pub fn children(&self, id: NodeId) -> TransformResult<Vec<NodeId>> {
        self.read_state(id, |state| state.children.clone())
    }

    /// Entity that owns a node
    pub fn owner(&self, id: NodeId) -> TransformResult<EntityId> {
        self.read_state(id, |state| state.owner)
    }

    /// Move `child` under `parent`, or make it a root with `None`
    ///
    /// The child is detached from its old parent before being attached to
    /// the new one. Its world matrix (and its descendants') is invalidated;
    /// its local matrix is not.
    pub fn set_parent(&self, child: NodeId, parent: Option<NodeId>) -> TransformResult<()> {
        let mut nodes = self.nodes.write();
        let old_parent = nodes
            .get_mut(child)
            .ok_or(TransformError::NodeNotFound(child))?
            .state
            .get_mut()
            .parent;

        if let Some(parent_id) = parent {
            Self::ensure_acyclic(&mut nodes, parent_id, child)?;
        }
        if old_parent == parent {
            return Ok(());
        }

        if let Some(old_id) = old_parent {
            if let Some(old_node) = nodes.get_mut(old_id) {
                old_node.state.get_mut().children.retain(|c| *c != child);
            }
        }
        if let Some(new_id) = parent {
            if let Some(new_node) = nodes.get_mut(new_id) {
                new_node.state.get_mut().children.push(child);
            }
        }
        if let Some(child_node) = nodes.get_mut(child) {
            child_node.state.get_mut().parent = parent;
        }

        log::debug!("Reparented {:?}: {:?} -> {:?}", child, old_parent, parent);

        let nodes = RwLockWriteGuard::downgrade(nodes);
        let mut pending = PendingNotifications::default();
        Self::invalidate_world(&nodes, child, MatrixKind::World, &mut pending);
        drop(nodes);
        pending.dispatch();
        Ok(())
    }

    /// Attach `child` under `parent`
    pub fn add_child(&self, parent: NodeId, child: NodeId) -> TransformResult<()> {
        self.set_parent(child, Some(parent))
    }

    /// Detach `child` from `parent`; the child becomes a root
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> TransformResult<()> {
        if !self.contains(parent) {
            return Err(TransformError::NodeNotFound(parent));
        }
        if self.parent(child)? != Some(parent) {
            return Err(TransformError::NotAChild { parent, child });
        }
        self.set_parent(child, None)
    }

    fn ensure_acyclic(
        nodes: &mut NodeMap<TransformNode>,
        parent: NodeId,
        child: NodeId,
    ) -> TransformResult<()> {
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(TransformError::CycleDetected { parent, child });
            }
            cursor = nodes
                .get_mut(current)
                .ok_or(TransformError::NodeNotFound(current))?
                .state
                .get_mut()
                .parent;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Local transform
    // ------------------------------------------------------------------

    /// Replace scale, translation and rotation at once
    ///
    /// Values are not validated; NaN and infinities propagate into the
    /// matrices.
    pub fn set_local(
        &self,
        id: NodeId,
        scale: Vec3,
        translation: Vec3,
        rotation: Quat,
    ) -> TransformResult<()> {
        self.modify_local(id, |state| {
            state.scale = scale;
            state.translation = translation;
            state.rotation = rotation;
        })
    }

    /// Set the local scale
    pub fn set_scale(&self, id: NodeId, scale: Vec3) -> TransformResult<()> {
        self.modify_local(id, |state| state.scale = scale)
    }

    /// Set the local translation
    pub fn set_translation(&self, id: NodeId, translation: Vec3) -> TransformResult<()> {
        self.modify_local(id, |state| state.translation = translation)
    }

    /// Set the local rotation
    pub fn set_rotation(&self, id: NodeId, rotation: Quat) -> TransformResult<()> {
        self.modify_local(id, |state| state.rotation = rotation)
    }

    /// Change the composition order of the local matrix
    pub fn set_order(&self, id: NodeId, order: CompositionOrder) -> TransformResult<()> {
        self.modify_local(id, |state| state.set_order(order))
    }

    /// Local scale
    pub fn scale(&self, id: NodeId) -> TransformResult<Vec3> {
        self.read_state(id, |state| state.scale)
    }

    /// Local translation
    pub fn translation(&self, id: NodeId) -> TransformResult<Vec3> {
        self.read_state(id, |state| state.translation)
    }

    /// Local rotation
    pub fn rotation(&self, id: NodeId) -> TransformResult<Quat> {
        self.read_state(id, |state| state.rotation)
    }

    /// Composition order of the local matrix
    pub fn order(&self, id: NodeId) -> TransformResult<CompositionOrder> {
        self.read_state(id, |state| state.order())
    }

    // ------------------------------------------------------------------
    // Matrices
    // ------------------------------------------------------------------

    /// Local matrix, recomputed if dirty
    pub fn local_matrix(&self, id: NodeId) -> TransformResult<Mat4> {
        self.read_state(id, NodeState::local_matrix)
    }

    /// World matrix (`parent.world * local`, or `local` at a root)
    pub fn world_matrix(&self, id: NodeId) -> TransformResult<Mat4> {
        let nodes = self.nodes.read();
        let (_, world) = Self::resolve_world(&nodes, id)?;
        Ok(world)
    }

    /// Inverse of the local matrix; identity with `invertible == false` if singular
    pub fn inverse_local_matrix(&self, id: NodeId) -> TransformResult<InverseMatrix> {
        self.read_state(id, NodeState::inverse_local)
    }

    /// Inverse of the world matrix; identity with `invertible == false` if singular
    pub fn inverse_world_matrix(&self, id: NodeId) -> TransformResult<InverseMatrix> {
        let nodes = self.nodes.read();
        let (mut state, world) = Self::resolve_world(&nodes, id)?;
        Ok(state.inverse_world(&world))
    }

    /// Inverse of the local matrix for callers that require invertibility
    pub fn strict_inverse_local_matrix(&self, id: NodeId) -> TransformResult<Mat4> {
        let inverse = self.inverse_local_matrix(id)?;
        if inverse.invertible {
            Ok(inverse.matrix)
        } else {
            Err(TransformError::SingularMatrix(id))
        }
    }

    /// Inverse of the world matrix for callers that require invertibility
    pub fn strict_inverse_world_matrix(&self, id: NodeId) -> TransformResult<Mat4> {
        let inverse = self.inverse_world_matrix(id)?;
        if inverse.invertible {
            Ok(inverse.matrix)
        } else {
            Err(TransformError::SingularMatrix(id))
        }
    }

    /// Resolve the world matrix of `id` and return it with the node still locked
    fn resolve_world(
        nodes: &NodeMap<TransformNode>,
        id: NodeId,
    ) -> TransformResult<(MutexGuard<'_, NodeState>, Mat4)> {
        loop {
            let (anchor, chain) = Self::dirty_chain(nodes, id)?;
            if let Some(resolved) = Self::recompute_chain(nodes, anchor, &chain)? {
                return Ok(resolved);
            }
            log::trace!("World of {:?} invalidated while resolving, retrying", id);
        }
    }

    /// Nodes from `id` upward whose world cache is dirty, plus the first
    /// clean ancestor above them (`None` when the chain reaches a root)
    fn dirty_chain(
        nodes: &NodeMap<TransformNode>,
        id: NodeId,
    ) -> TransformResult<(Option<NodeId>, Vec<NodeId>)> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = nodes.get(current).ok_or(TransformError::NodeNotFound(current))?;
            let state = node.state.lock();
            if !state.world.is_dirty() {
                return Ok((Some(current), chain));
            }
            chain.push(current);
            cursor = state.parent;
        }
        Ok((None, chain))
    }

    /// Recompute `chain` top-down from `anchor`
    ///
    /// Returns `None` if the anchor was invalidated after the walk.
    fn recompute_chain<'a>(
        nodes: &'a NodeMap<TransformNode>,
        anchor: Option<NodeId>,
        chain: &[NodeId],
    ) -> TransformResult<Option<(MutexGuard<'a, NodeState>, Mat4)>> {
        let mut resolved = match anchor {
            Some(anchor_id) => {
                let node = nodes.get(anchor_id).ok_or(TransformError::NodeNotFound(anchor_id))?;
                let state = node.state.lock();
                match state.world.cached() {
                    Some(world) => Some((state, world)),
                    None => return Ok(None),
                }
            }
            None => None,
        };

        for &current in chain.iter().rev() {
            let node = nodes.get(current).ok_or(TransformError::NodeNotFound(current))?;
            let mut state = node.state.lock();
            let local = state.local_matrix();
            let parent_world = resolved.as_ref().map(|(_, world)| *world);
            let world = state
                .world
                .get_or_update(|| parent_world.map_or(local, |parent| parent * local));
            // Releases the parent only after the child is locked
            resolved = Some((state, world));
        }
        Ok(resolved)
    }

    // ------------------------------------------------------------------
    // Invalidation
    // ------------------------------------------------------------------

    /// Invalidate the local caches of a node and the world caches of its subtree
    pub fn mark_local_modified(&self, id: NodeId) -> TransformResult<()> {
        self.modify_local(id, |_| {})
    }

    /// Invalidate the world caches of a node and every descendant
    pub fn mark_world_modified(&self, id: NodeId) -> TransformResult<()> {
        let mut pending = PendingNotifications::default();
        {
            let nodes = self.nodes.read();
            if !nodes.contains_key(id) {
                return Err(TransformError::NodeNotFound(id));
            }
            Self::invalidate_world(&nodes, id, MatrixKind::World, &mut pending);
        }
        pending.dispatch();
        Ok(())
    }

    /// Whether the next world read of `id` will recompute
    pub fn is_world_dirty(&self, id: NodeId) -> TransformResult<bool> {
        self.read_state(id, |state| state.world.is_dirty())
    }

    /// Recompute counters of the four caches of `id`
    pub fn cache_stats(&self, id: NodeId) -> TransformResult<CacheStats> {
        self.read_state(id, |state| state.stats())
    }

    fn modify_local(&self, id: NodeId, apply: impl FnOnce(&mut NodeState)) -> TransformResult<()> {
        let mut pending = PendingNotifications::default();
        {
            let nodes = self.nodes.read();
            {
                let node = nodes.get(id).ok_or(TransformError::NodeNotFound(id))?;
                let mut state = node.state.lock();
                apply(&mut state);
                state.mark_local_dirty();
            }
            Self::invalidate_world(&nodes, id, MatrixKind::Local, &mut pending);
        }
        pending.dispatch();
        Ok(())
    }

    /// Mark world caches dirty for `root` and all of its descendants
    ///
    /// Descends unconditionally, even into children that are already dirty:
    /// a partially invalidated subtree can never hide a stale descendant.
    fn invalidate_world(
        nodes: &NodeMap<TransformNode>,
        root: NodeId,
        root_kind: MatrixKind,
        pending: &mut PendingNotifications,
    ) {
        let mut stack = vec![(root, root_kind)];
        while let Some((current, kind)) = stack.pop() {
            let Some(node) = nodes.get(current) else {
                log::warn!("Transform node {:?} vanished during invalidation", current);
                continue;
            };
            let mut state = node.state.lock();
            state.mark_world_dirty();
            stack.extend(state.children.iter().map(|child| (*child, MatrixKind::World)));
            pending.push_all(&state.listeners, MatrixChanged { node: current, kind });
        }
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Register a listener for matrix changes of `id`
    ///
    /// Listeners run after the tree has released its locks.
    pub fn subscribe(
        &self,
        id: NodeId,
        listener: impl Fn(&MatrixChanged) + Send + Sync + 'static,
    ) -> TransformResult<SubscriptionId> {
        let subscription = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.read_state(id, |state| state.listeners.push((subscription, Arc::new(listener))))?;
        Ok(subscription)
    }

    /// Remove a listener; returns whether it was registered on `id`
    pub fn unsubscribe(&self, id: NodeId, subscription: SubscriptionId) -> TransformResult<bool> {
        self.read_state(id, |state| {
            let before = state.listeners.len();
            state.listeners.retain(|(sub, _)| *sub != subscription);
            state.listeners.len() != before
        })
    }

    fn read_state<R>(&self, id: NodeId, read: impl FnOnce(&mut NodeState) -> R) -> TransformResult<R> {
        let nodes = self.nodes.read();
        let node = nodes.get(id).ok_or(TransformError::NodeNotFound(id))?;
        let mut state = node.state.lock();
        Ok(read(&mut state))
    }
}

impl Default for TransformTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransformTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformTree")
            .field("nodes", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::translation_of;
    use approx::assert_relative_eq;
    use std::sync::Mutex;

    const EPSILON: f32 = 1e-5;

    fn entity(id: u32) -> EntityId {
        EntityId::new(id)
    }

    #[test]
    fn test_root_world_equals_local() {
        let tree = TransformTree::new();
        let root = tree.create_node(entity(1), None).unwrap();
        tree.set_translation(root, Vec3::new(3.0, 0.0, 0.0)).unwrap();

        assert_eq!(tree.world_matrix(root).unwrap(), tree.local_matrix(root).unwrap());
    }

    #[test]
    fn test_child_world_follows_parent_translation() {
        let tree = TransformTree::new();
        let root = tree.create_node(entity(1), None).unwrap();
        let child = tree.create_node(entity(2), Some(root)).unwrap();
        tree.set_translation(child, Vec3::new(1.0, 0.0, 0.0)).unwrap();

        let world = tree.world_matrix(child).unwrap();
        assert_relative_eq!(translation_of(&world), Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);

        tree.set_translation(root, Vec3::new(0.0, 5.0, 0.0)).unwrap();
        let world = tree.world_matrix(child).unwrap();
        assert_relative_eq!(translation_of(&world), Vec3::new(1.0, 5.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_local_change_dirties_every_descendant() {
        let tree = TransformTree::new();
        let root = tree.create_node(entity(1), None).unwrap();
        let middle = tree.create_node(entity(2), Some(root)).unwrap();
        let leaf = tree.create_node(entity(3), Some(middle)).unwrap();

        tree.world_matrix(leaf).unwrap();
        let before = tree.cache_stats(leaf).unwrap();
        assert!(!tree.is_world_dirty(leaf).unwrap());
        assert!(!tree.is_world_dirty(middle).unwrap());

        tree.set_scale(root, Vec3::new(2.0, 2.0, 2.0)).unwrap();
        assert!(tree.is_world_dirty(middle).unwrap());
        assert!(tree.is_world_dirty(leaf).unwrap());

        tree.world_matrix(leaf).unwrap();
        let after = tree.cache_stats(leaf).unwrap();
        assert_eq!(after.world, before.world + 1);
        assert_eq!(after.local, before.local, "leaf local was never touched");
    }

    #[test]
    fn test_cached_reads_do_not_recompute() {
        let tree = TransformTree::new();
        let root = tree.create_node(entity(1), None).unwrap();
        let child = tree.create_node(entity(2), Some(root)).unwrap();

        for _ in 0..5 {
            tree.world_matrix(child).unwrap();
        }
        let stats = tree.cache_stats(child).unwrap();
        assert_eq!(stats.world, 1);
        assert_eq!(stats.local, 1);
    }

    #[test]
    fn test_reparent_marks_world_not_local() {
        let tree = TransformTree::new();
        let a = tree.create_node(entity(1), None).unwrap();
        let b = tree.create_node(entity(2), None).unwrap();
        let child = tree.create_node(entity(3), Some(a)).unwrap();
        tree.set_translation(a, Vec3::new(10.0, 0.0, 0.0)).unwrap();
        tree.set_translation(b, Vec3::new(0.0, 0.0, -4.0)).unwrap();

        tree.world_matrix(child).unwrap();
        let before = tree.cache_stats(child).unwrap();

        tree.add_child(b, child).unwrap();
        assert_eq!(tree.children(a).unwrap(), Vec::<NodeId>::new());
        assert_eq!(tree.children(b).unwrap(), vec![child]);
        assert_eq!(tree.parent(child).unwrap(), Some(b));

        let world = tree.world_matrix(child).unwrap();
        assert_relative_eq!(translation_of(&world), Vec3::new(0.0, 0.0, -4.0), epsilon = EPSILON);

        let after = tree.cache_stats(child).unwrap();
        assert_eq!(after.local, before.local);
        assert_eq!(after.world, before.world + 1);
    }

    #[test]
    fn test_cycles_are_rejected() {
        let tree = TransformTree::new();
        let root = tree.create_node(entity(1), None).unwrap();
        let child = tree.create_node(entity(2), Some(root)).unwrap();
        let grandchild = tree.create_node(entity(3), Some(child)).unwrap();

        assert_eq!(
            tree.add_child(grandchild, root),
            Err(TransformError::CycleDetected { parent: grandchild, child: root })
        );
        assert_eq!(
            tree.add_child(root, root),
            Err(TransformError::CycleDetected { parent: root, child: root })
        );
        assert_eq!(tree.parent(root).unwrap(), None);
    }

    #[test]
    fn test_remove_child_makes_root() {
        let tree = TransformTree::new();
        let root = tree.create_node(entity(1), None).unwrap();
        let other = tree.create_node(entity(2), None).unwrap();
        let child = tree.create_node(entity(3), Some(root)).unwrap();
        tree.set_translation(root, Vec3::new(1.0, 1.0, 1.0)).unwrap();

        assert_eq!(
            tree.remove_child(other, child),
            Err(TransformError::NotAChild { parent: other, child })
        );

        tree.remove_child(root, child).unwrap();
        assert_eq!(tree.parent(child).unwrap(), None);
        assert_eq!(tree.world_matrix(child).unwrap(), Mat4::identity());
        assert_eq!(tree.roots().len(), 3);
    }

    #[test]
    fn test_remove_node_destroys_subtree() {
        let tree = TransformTree::new();
        let root = tree.create_node(entity(1), None).unwrap();
        let child = tree.create_node(entity(2), Some(root)).unwrap();
        let grandchild = tree.create_node(entity(3), Some(child)).unwrap();
        let sibling = tree.create_node(entity(4), Some(root)).unwrap();

        assert_eq!(tree.remove_node(child).unwrap(), 2);
        assert!(!tree.contains(child));
        assert!(!tree.contains(grandchild));
        assert_eq!(tree.children(root).unwrap(), vec![sibling]);
        assert_eq!(tree.world_matrix(grandchild), Err(TransformError::NodeNotFound(grandchild)));
    }

    #[test]
    fn test_inverse_world_round_trip() {
        let tree = TransformTree::new();
        let root = tree.create_node(entity(1), None).unwrap();
        let child = tree.create_node(entity(2), Some(root)).unwrap();
        tree.set_local(
            root,
            Vec3::new(2.0, 2.0, 2.0),
            Vec3::new(0.0, 1.0, 0.0),
            Quat::from_euler_angles(0.0, 0.5, 0.0),
        )
        .unwrap();
        tree.set_local(
            child,
            Vec3::new(1.0, 3.0, 0.5),
            Vec3::new(4.0, 0.0, -1.0),
            Quat::from_euler_angles(0.2, 0.0, 0.3),
        )
        .unwrap();

        let world = tree.world_matrix(child).unwrap();
        let inverse = tree.inverse_world_matrix(child).unwrap();
        assert!(inverse.invertible);
        assert_relative_eq!(world * inverse.matrix, Mat4::identity(), epsilon = EPSILON);

        let strict = tree.strict_inverse_world_matrix(child).unwrap();
        assert_relative_eq!(strict, inverse.matrix, epsilon = EPSILON);
    }

    #[test]
    fn test_singular_inverse_reports_failure() {
        let tree = TransformTree::new();
        let node = tree.create_node(entity(1), None).unwrap();
        tree.set_scale(node, Vec3::new(1.0, 0.0, 1.0)).unwrap();

        let inverse = tree.inverse_local_matrix(node).unwrap();
        assert!(!inverse.invertible);
        assert_eq!(inverse.matrix, Mat4::identity());
        assert_eq!(
            tree.strict_inverse_local_matrix(node),
            Err(TransformError::SingularMatrix(node))
        );
        assert_eq!(
            tree.strict_inverse_world_matrix(node),
            Err(TransformError::SingularMatrix(node))
        );
    }

    #[test]
    fn test_nan_propagates() {
        let tree = TransformTree::new();
        let node = tree.create_node(entity(1), None).unwrap();
        tree.set_translation(node, Vec3::new(f32::NAN, 0.0, 0.0)).unwrap();

        let world = tree.world_matrix(node).unwrap();
        assert!(world.m14.is_nan());
    }

    #[test]
    fn test_order_changes_local_matrix() {
        let tree = TransformTree::new();
        let node = tree.create_node(entity(1), None).unwrap();
        tree.set_scale(node, Vec3::new(2.0, 2.0, 2.0)).unwrap();
        tree.set_translation(node, Vec3::new(1.0, 0.0, 0.0)).unwrap();

        let trs = tree.local_matrix(node).unwrap();
        tree.set_order(node, CompositionOrder::Srt).unwrap();
        assert_eq!(tree.order(node).unwrap(), CompositionOrder::Srt);
        let srt = tree.local_matrix(node).unwrap();

        assert_relative_eq!(translation_of(&trs), Vec3::new(1.0, 0.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(translation_of(&srt), Vec3::new(2.0, 0.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_listeners_receive_subtree_changes() {
        let tree = TransformTree::new();
        let root = tree.create_node(entity(1), None).unwrap();
        let child = tree.create_node(entity(2), Some(root)).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = tree
            .subscribe(child, move |event| sink.lock().unwrap().push(*event))
            .unwrap();

        tree.set_translation(root, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        tree.set_translation(child, Vec3::new(0.0, 1.0, 0.0)).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                MatrixChanged { node: child, kind: MatrixKind::World },
                MatrixChanged { node: child, kind: MatrixKind::Local },
            ]
        );

        assert!(tree.unsubscribe(child, subscription).unwrap());
        tree.set_translation(root, Vec3::zeros()).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_listener_may_read_tree() {
        let tree = Arc::new(TransformTree::new());
        let root = tree.create_node(entity(1), None).unwrap();

        let observed = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&observed);
        let reader = Arc::clone(&tree);
        tree.subscribe(root, move |event| {
            let world = reader.world_matrix(event.node).ok();
            *sink.lock().unwrap() = world.map(|m| translation_of(&m));
        })
        .unwrap();

        tree.set_translation(root, Vec3::new(0.0, 0.0, 7.0)).unwrap();
        assert_eq!(*observed.lock().unwrap(), Some(Vec3::new(0.0, 0.0, 7.0)));
    }

    #[test]
    fn test_world_of_deep_chain() {
        const DEPTH: usize = 20_000;
        let tree = TransformTree::with_capacity(DEPTH);
        let mut parent = None;
        for i in 0..DEPTH {
            let node = tree.create_node(entity(i as u32), parent).unwrap();
            tree.set_translation(node, Vec3::new(1.0, 0.0, 0.0)).unwrap();
            parent = Some(node);
        }
        let leaf = parent.unwrap();
        let root = tree.roots()[0];

        let world = tree.world_matrix(leaf).unwrap();
        assert_relative_eq!(translation_of(&world), Vec3::new(DEPTH as f32, 0.0, 0.0), epsilon = 1e-2);

        tree.set_translation(root, Vec3::new(1.0, 2.0, 0.0)).unwrap();
        assert!(tree.is_world_dirty(leaf).unwrap());
        let inverse = tree.inverse_world_matrix(leaf).unwrap();
        assert!(inverse.invertible);
        assert_relative_eq!(
            translation_of(&inverse.matrix),
            Vec3::new(-(DEPTH as f32), -2.0, 0.0),
            epsilon = 1e-2
        );
        assert_eq!(tree.cache_stats(leaf).unwrap().world, 2);
    }

    #[test]
    fn test_world_read_reuses_clean_ancestor() {
        let tree = TransformTree::new();
        let root = tree.create_node(entity(1), None).unwrap();
        let middle = tree.create_node(entity(2), Some(root)).unwrap();
        let leaf = tree.create_node(entity(3), Some(middle)).unwrap();

        tree.world_matrix(middle).unwrap();
        tree.set_translation(leaf, Vec3::new(0.0, 0.0, 1.0)).unwrap();
        tree.world_matrix(leaf).unwrap();

        assert_eq!(tree.cache_stats(root).unwrap().world, 1);
        assert_eq!(tree.cache_stats(middle).unwrap().world, 1);
        assert_eq!(tree.cache_stats(leaf).unwrap().world, 1);
    }

    #[test]
    fn test_unknown_node_errors() {
        let tree = TransformTree::new();
        let node = tree.create_node(entity(1), None).unwrap();
        tree.remove_node(node).unwrap();

        assert_eq!(tree.world_matrix(node), Err(TransformError::NodeNotFound(node)));
        assert_eq!(tree.set_scale(node, Vec3::zeros()), Err(TransformError::NodeNotFound(node)));
        assert_eq!(tree.create_node(entity(2), Some(node)), Err(TransformError::NodeNotFound(node)));
        assert!(tree.is_empty());
    }
}
