//! Z-index sorted render command

use std::sync::atomic::{AtomicI32, Ordering as AtomicOrdering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::camera::Camera;
use super::command::{CommandFlags, CommandState, PassId, RenderCommand, SortKey};

/// Drawing backend of a 2D command
pub trait Drawable2D: Send + Sync + 'static {
    /// Per-frame draw state
    type State: Clone + Send + Sync;

    /// Issue the draw from a committed snapshot
    fn draw(&self, snapshot: &Self::State, shadow_pass: bool);
}

/// 2D render command sorted by z-index
///
/// `set_z_index` writes the pending value; the sort key only picks it up at
/// the next [`RenderCommand::collected_for_render`], so reordering never
/// affects a frame that is already queued.
pub struct RenderCommand2D<D: Drawable2D> {
    flags: CommandFlags,
    drawable: D,
    state: Mutex<CommandState<D::State>>,
    z_index: AtomicI32,
    collected_z_index: AtomicI32,
}

impl<D: Drawable2D> RenderCommand2D<D> {
    /// Create a command for `pass` at `z_index`
    pub fn new(pass: PassId, z_index: i32, drawable: D, initial: D::State) -> Self {
        Self {
            flags: CommandFlags::new(pass),
            drawable,
            state: Mutex::new(CommandState::new(initial)),
            z_index: AtomicI32::new(z_index),
            collected_z_index: AtomicI32::new(z_index),
        }
    }

    /// Create a command already wrapped for sharing
    pub fn shared(pass: PassId, z_index: i32, drawable: D, initial: D::State) -> Arc<Self> {
        Arc::new(Self::new(pass, z_index, drawable, initial))
    }

    /// The drawing backend
    pub fn drawable(&self) -> &D {
        &self.drawable
    }

    /// Pending z-index
    pub fn z_index(&self) -> i32 {
        self.z_index.load(AtomicOrdering::Acquire)
    }

    /// Set the pending z-index
    pub fn set_z_index(&self, z_index: i32) {
        self.z_index.store(z_index, AtomicOrdering::Release);
    }

    /// Mutate the pending state
    pub fn update(&self, f: impl FnOnce(&mut D::State)) {
        f(self.state.lock().pending_mut());
    }

    /// Replace the pending state
    pub fn set_state(&self, state: D::State) {
        *self.state.lock().pending_mut() = state;
    }

    /// Copy of the pending state
    pub fn pending(&self) -> D::State {
        self.state.lock().pending().clone()
    }

    /// Copy of the committed snapshot
    pub fn snapshot(&self) -> D::State {
        self.state.lock().snapshot().clone()
    }
}

impl<D: Drawable2D> RenderCommand for RenderCommand2D<D> {
    fn render_pass(&self) -> PassId {
        self.flags.pass()
    }

    fn set_render_pass(&self, pass: PassId) {
        self.flags.set_pass(pass);
    }

    fn is_enabled(&self) -> bool {
        self.flags.enabled()
    }

    fn set_enabled(&self, enabled: bool) {
        self.flags.set_enabled(enabled);
    }

    fn sort_key(&self) -> SortKey {
        SortKey::ZIndex(self.collected_z_index.load(AtomicOrdering::Acquire))
    }

    fn collected_for_render(&self, _camera: Option<&Camera>, _shadow_pass: bool) {
        self.collected_z_index
            .store(self.z_index(), AtomicOrdering::Release);
    }

    fn swap_buffers(&self, _shadow_pass: bool) {
        self.state.lock().commit_snapshot();
    }

    fn render(&self, shadow_pass: bool) {
        let snapshot = self.snapshot();
        self.drawable.draw(&snapshot, shadow_pass);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Label;

    impl Drawable2D for Label {
        type State = String;

        fn draw(&self, _snapshot: &String, _shadow_pass: bool) {}
    }

    #[test]
    fn test_z_index_applies_at_collection() {
        let command = RenderCommand2D::new(2, 5, Label, String::from("hud"));
        assert_eq!(command.sort_key(), SortKey::ZIndex(5));

        command.set_z_index(-1);
        assert_eq!(command.z_index(), -1);
        assert_eq!(command.sort_key(), SortKey::ZIndex(5));

        command.collected_for_render(None, false);
        assert_eq!(command.sort_key(), SortKey::ZIndex(-1));
    }

    #[test]
    fn test_pending_isolated_from_snapshot() {
        let command = RenderCommand2D::new(2, 0, Label, String::from("a"));
        command.update(|text| text.push('b'));

        assert_eq!(command.pending(), "ab");
        assert_eq!(command.snapshot(), "a");

        command.swap_buffers(false);
        assert_eq!(command.snapshot(), "ab");
    }
}
