//! Specialized collection types

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable handle of a node inside a [`TransformTree`](crate::transform::TransformTree)
    ///
    /// Handles stay valid across reparenting and are never reused for a
    /// different node after removal.
    pub struct NodeId;
}

/// Handle-based map keyed by transform node handles
pub type NodeMap<T> = SlotMap<NodeId, T>;
