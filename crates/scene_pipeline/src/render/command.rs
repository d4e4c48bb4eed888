//! Render command abstraction
//!
//! A render command is the unit of drawing work. It keeps two copies of its
//! draw state: the *pending* copy written by the update thread and the
//! *snapshot* read by the render thread. `swap_buffers` commits pending into
//! snapshot while neither thread is touching the command.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering as AtomicOrdering};
use std::sync::Arc;

use super::camera::Camera;

/// Identifier of a render pass
///
/// Passes render in ascending id order.
pub type PassId = i32;

/// Reference-counted handle to a render command
///
/// Commands are owned by their render info and shared with the buckets of a
/// [`RenderCommandCollection`](super::RenderCommandCollection) for the frames
/// they are queued in.
pub type SharedCommand = Arc<dyn RenderCommand>;

/// Key a command exposes for ordering within a pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortKey {
    /// No ordering preference
    Unkeyed,
    /// 2D layering; smaller draws first
    ZIndex(i32),
    /// Squared distance to the camera captured at collection time
    Depth(f32),
}

impl SortKey {
    /// Z-index, or 0 when the key is not a z-index
    pub fn z_index(self) -> i32 {
        match self {
            SortKey::ZIndex(z) => z,
            _ => 0,
        }
    }

    /// Squared camera distance, or 0 when the key is not a depth
    pub fn depth(self) -> f32 {
        match self {
            SortKey::Depth(depth) => depth,
            _ => 0.0,
        }
    }

    fn rank(self) -> u8 {
        match self {
            SortKey::Unkeyed => 0,
            SortKey::ZIndex(_) => 1,
            SortKey::Depth(_) => 2,
        }
    }

    /// Total order over keys
    ///
    /// Keys of the same kind compare by value. Mixed kinds order unkeyed
    /// first, then z-indexed, then depth-keyed commands.
    pub fn compare(self, other: SortKey) -> Ordering {
        match (self, other) {
            (SortKey::ZIndex(a), SortKey::ZIndex(b)) => a.cmp(&b),
            (SortKey::Depth(a), SortKey::Depth(b)) => a.total_cmp(&b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

/// Unit of drawing work queued into a render pass
///
/// Implementations use interior mutability for their per-frame state so a
/// single `Arc` can sit in the updating bucket while an earlier frame of the
/// same command renders.
pub trait RenderCommand: Send + Sync {
    /// Pass this command is queued into
    fn render_pass(&self) -> PassId;

    /// Move the command to another pass (takes effect at the next collection)
    fn set_render_pass(&self, pass: PassId);

    /// Whether the command is collected and rendered
    fn is_enabled(&self) -> bool;

    /// Enable or disable the command
    fn set_enabled(&self, enabled: bool);

    /// Sort key captured at the last collection
    fn sort_key(&self) -> SortKey;

    /// Natural ordering against another command
    fn compare(&self, other: &dyn RenderCommand) -> Ordering {
        self.sort_key().compare(other.sort_key())
    }

    /// Called on the update thread just before the command is added to a pass
    fn collected_for_render(&self, camera: Option<&Camera>, shadow_pass: bool);

    /// Commit pending state into the render snapshot
    fn swap_buffers(&self, shadow_pass: bool);

    /// Draw from the snapshot
    fn render(&self, shadow_pass: bool);
}

/// Double-buffered draw state
#[derive(Debug, Clone, PartialEq)]
pub struct CommandState<T> {
    pending: T,
    snapshot: T,
}

impl<T: Clone> CommandState<T> {
    /// Both copies start equal to `initial`
    pub fn new(initial: T) -> Self {
        Self {
            snapshot: initial.clone(),
            pending: initial,
        }
    }

    /// State the next frame will render
    pub fn pending(&self) -> &T {
        &self.pending
    }

    /// Mutable access for the update thread
    pub fn pending_mut(&mut self) -> &mut T {
        &mut self.pending
    }

    /// State the render thread reads
    pub fn snapshot(&self) -> &T {
        &self.snapshot
    }

    /// Copy pending into snapshot
    pub fn commit_snapshot(&mut self) {
        self.snapshot.clone_from(&self.pending);
    }
}

impl<T: Clone + Default> Default for CommandState<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Pass assignment and enable flag shared by command implementations
#[derive(Debug)]
pub struct CommandFlags {
    pass: AtomicI32,
    enabled: AtomicBool,
}

impl CommandFlags {
    /// Enabled flags for `pass`
    pub fn new(pass: PassId) -> Self {
        Self {
            pass: AtomicI32::new(pass),
            enabled: AtomicBool::new(true),
        }
    }

    /// Current pass
    pub fn pass(&self) -> PassId {
        self.pass.load(AtomicOrdering::Acquire)
    }

    /// Reassign pass
    pub fn set_pass(&self, pass: PassId) {
        self.pass.store(pass, AtomicOrdering::Release);
    }

    /// Enabled state
    pub fn enabled(&self) -> bool {
        self.enabled.load(AtomicOrdering::Acquire)
    }

    /// Set enabled state
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, AtomicOrdering::Release);
    }
}
