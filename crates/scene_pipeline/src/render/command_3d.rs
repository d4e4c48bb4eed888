//! Camera-distance sorted render command

use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::camera::Camera;
use super::command::{CommandFlags, CommandState, PassId, RenderCommand, SortKey};
use crate::foundation::math::Vec3;

/// Drawing backend of a 3D command
///
/// `State` is everything the draw call needs (transform, material
/// parameters, ...). It is cloned once per frame into the snapshot.
pub trait Drawable3D: Send + Sync + 'static {
    /// Per-frame draw state
    type State: Clone + Send + Sync;

    /// World position used for the camera distance sort key
    fn world_position(&self, state: &Self::State) -> Vec3;

    /// Issue the draw from a committed snapshot
    fn draw(&self, snapshot: &Self::State, shadow_pass: bool);
}

/// 3D render command sorted by squared distance to the camera
///
/// The distance is captured in [`RenderCommand::collected_for_render`] from
/// the pending state; with no camera it is 0.
pub struct RenderCommand3D<D: Drawable3D> {
    flags: CommandFlags,
    drawable: D,
    state: Mutex<CommandState<D::State>>,
    distance_squared: AtomicU32,
}

impl<D: Drawable3D> RenderCommand3D<D> {
    /// Create a command for `pass` with both buffers set to `initial`
    pub fn new(pass: PassId, drawable: D, initial: D::State) -> Self {
        Self {
            flags: CommandFlags::new(pass),
            drawable,
            state: Mutex::new(CommandState::new(initial)),
            distance_squared: AtomicU32::new(0.0_f32.to_bits()),
        }
    }

    /// Create a command already wrapped for sharing
    pub fn shared(pass: PassId, drawable: D, initial: D::State) -> Arc<Self> {
        Arc::new(Self::new(pass, drawable, initial))
    }

    /// The drawing backend
    pub fn drawable(&self) -> &D {
        &self.drawable
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

    /// Squared camera distance captured at the last collection
    pub fn distance_squared(&self) -> f32 {
        f32::from_bits(self.distance_squared.load(AtomicOrdering::Acquire))
    }
}

impl<D: Drawable3D> RenderCommand for RenderCommand3D<D> {
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
        SortKey::Depth(self.distance_squared())
    }

    fn collected_for_render(&self, camera: Option<&Camera>, _shadow_pass: bool) {
        let distance = match camera {
            Some(camera) => {
                let position = self.drawable.world_position(self.state.lock().pending());
                camera.distance_squared_to(&position)
            }
            None => 0.0,
        };
        self.distance_squared
            .store(distance.to_bits(), AtomicOrdering::Release);
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

    struct Marker {
        drawn: Mutex<Vec<(Vec3, bool)>>,
    }

    impl Drawable3D for Marker {
        type State = Vec3;

        fn world_position(&self, state: &Vec3) -> Vec3 {
            *state
        }

        fn draw(&self, snapshot: &Vec3, shadow_pass: bool) {
            self.drawn.lock().push((*snapshot, shadow_pass));
        }
    }

    fn marker_command(position: Vec3) -> RenderCommand3D<Marker> {
        let marker = Marker {
            drawn: Mutex::new(Vec::new()),
        };
        RenderCommand3D::new(0, marker, position)
    }

    #[test]
    fn test_distance_captured_at_collection() {
        let command = marker_command(Vec3::new(3.0, 4.0, 0.0));
        let camera = Camera::perspective(Vec3::zeros(), 60.0, 1.0, 0.1, 100.0);

        assert_eq!(command.sort_key(), SortKey::Depth(0.0));
        command.collected_for_render(Some(&camera), false);
        assert_eq!(command.sort_key(), SortKey::Depth(25.0));

        // Moving after collection does not change the captured key
        command.set_state(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(command.distance_squared(), 25.0);

        command.collected_for_render(None, false);
        assert_eq!(command.distance_squared(), 0.0);
    }

    #[test]
    fn test_render_reads_snapshot_only() {
        let command = marker_command(Vec3::new(1.0, 0.0, 0.0));
        command.update(|position| position.x = 5.0);

        command.render(true);
        command.swap_buffers(true);
        command.render(false);

        let drawn = command.drawable().drawn.lock().clone();
        assert_eq!(
            drawn,
            vec![(Vec3::new(1.0, 0.0, 0.0), true), (Vec3::new(5.0, 0.0, 0.0), false)]
        );
    }
}
