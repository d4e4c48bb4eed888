//! Matrix-changed notifications
//!
//! Listeners are registered per node. Invalidation only records which
//! listeners to call; delivery happens after every node lock and the arena
//! lock have been released, so a listener may freely read or mutate the tree.

use std::sync::Arc;

use crate::foundation::collections::NodeId;

/// Which matrix of a node changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixKind {
    /// The node's own local transform changed (its world changed with it)
    Local,
    /// Only the world matrix changed, through an ancestor or a reparent
    World,
}

/// Notification payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixChanged {
    /// Node whose matrices were invalidated
    pub node: NodeId,
    /// What changed
    pub kind: MatrixKind,
}

/// Callback invoked when a node's matrices are invalidated
pub type MatrixListener = Arc<dyn Fn(&MatrixChanged) + Send + Sync>;

/// Handle returned by [`TransformTree::subscribe`](super::TransformTree::subscribe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

/// Notifications gathered while locks are held
#[derive(Default)]
pub(crate) struct PendingNotifications {
    queue: Vec<(MatrixListener, MatrixChanged)>,
}

impl PendingNotifications {
    pub(crate) fn push_all(
        &mut self,
        listeners: &[(SubscriptionId, MatrixListener)],
        event: MatrixChanged,
    ) {
        self.queue
            .extend(listeners.iter().map(|(_, listener)| (Arc::clone(listener), event)));
    }

    /// Deliver in invalidation order; must run with no tree lock held
    pub(crate) fn dispatch(self) {
        for (listener, event) in self.queue {
            listener(&event);
        }
    }
}
