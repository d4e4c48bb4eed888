//! Transform hierarchy errors

use thiserror::Error;

use crate::foundation::collections::NodeId;

/// Errors returned by [`TransformTree`](super::TransformTree) operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The handle does not name a live node
    #[error("transform node {0:?} does not exist")]
    NodeNotFound(NodeId),

    /// Attaching would make a node its own ancestor
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    CycleDetected {
        /// Requested parent
        parent: NodeId,
        /// Node being attached
        child: NodeId,
    },

    /// `remove_child` was given a node that is not a child of `parent`
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Claimed parent
        parent: NodeId,
        /// Node that was expected to be its child
        child: NodeId,
    },

    /// Strict inversion requested on a singular matrix
    #[error("matrix of node {0:?} is not invertible")]
    SingularMatrix(NodeId),
}
