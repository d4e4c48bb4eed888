//! Render info: the per-object gatekeeper between the scene and the passes
//!
//! A render info owns the render commands of one visible object, decides per
//! camera whether they should be collected, and keeps the object's entry in
//! its visual scene's spatial index in sync with its visibility.
//!
//! Invariant: an info is registered in its scene's index if and only if it
//! is visible and has a scene.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use super::camera::Camera;
use super::collection::RenderCommandCollection;
use super::command::SharedCommand;
use crate::scene::{CullingVolume, VisualScene};

/// Process-unique identifier of a render info
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderInfoId(u64);

impl RenderInfoId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Raw numeric value
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Visibility rule and command source of one renderable object
pub trait RenderInfo: Send + Sync {
    /// Identity used by the spatial index
    fn id(&self) -> RenderInfoId;

    /// Visibility flag
    fn is_visible(&self) -> bool;

    /// Bounds tested against the camera volume, `None` for always visible
    fn culling_volume(&self) -> Option<CullingVolume>;

    /// Owned render commands
    fn commands(&self) -> &[SharedCommand];

    /// Whether this object's commands should be collected into `passes`
    /// for the given camera
    fn allow_render(
        &self,
        camera_volume: Option<&CullingVolume>,
        passes: &RenderCommandCollection,
        camera: Option<&Camera>,
    ) -> bool;

    /// Collect every enabled command into `passes`
    ///
    /// Each command is notified through `collected_for_render` before it is
    /// added. Returns how many commands were accepted by the collection.
    fn add_render_commands(&self, passes: &RenderCommandCollection, camera: Option<&Camera>) -> usize {
        let shadow_pass = passes.is_shadow_pass();
        let mut added = 0;
        for command in self.commands() {
            if !command.is_enabled() {
                continue;
            }
            command.collected_for_render(camera, shadow_pass);
            if passes.add(Arc::clone(command)) {
                added += 1;
            }
        }
        added
    }
}

/// State shared by the concrete render infos
///
/// Owns the commands and the scene membership. Dropping it removes the
/// info from its scene.
pub(crate) struct RenderInfoCore {
    id: RenderInfoId,
    visible: bool,
    scene: Option<Arc<VisualScene>>,
    commands: Vec<SharedCommand>,
}

impl RenderInfoCore {
    pub(crate) fn new() -> Self {
        Self {
            id: RenderInfoId::next(),
            visible: true,
            scene: None,
            commands: Vec::new(),
        }
    }

    pub(crate) fn id(&self) -> RenderInfoId {
        self.id
    }

    pub(crate) fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn scene(&self) -> Option<&Arc<VisualScene>> {
        self.scene.as_ref()
    }

    pub(crate) fn commands(&self) -> &[SharedCommand] {
        &self.commands
    }

    /// Scene the info is currently registered in
    fn registered_scene(&self) -> Option<&Arc<VisualScene>> {
        if self.visible {
            self.scene.as_ref()
        } else {
            None
        }
    }

    pub(crate) fn set_visible(&mut self, visible: bool, volume: Option<CullingVolume>) {
        let scene = self.scene.clone();
        self.transition(visible, scene, volume);
    }

    pub(crate) fn set_scene(&mut self, scene: Option<Arc<VisualScene>>, volume: Option<CullingVolume>) {
        self.transition(self.visible, scene, volume);
    }

    /// Push a changed volume to the index when registered
    pub(crate) fn volume_changed(&self, volume: Option<CullingVolume>) {
        if let Some(scene) = self.registered_scene() {
            scene.update_volume(self.id, volume);
        }
    }

    fn transition(&mut self, visible: bool, scene: Option<Arc<VisualScene>>, volume: Option<CullingVolume>) {
        let before = self.registered_scene().cloned();
        self.visible = visible;
        self.scene = scene;

        match (before, self.registered_scene()) {
            (Some(old), Some(new)) if Arc::ptr_eq(&old, new) => {}
            (old, new) => {
                if let Some(old) = old {
                    old.unregister(self.id);
                }
                if let Some(new) = new {
                    new.register(self.id, volume);
                }
            }
        }
    }

    pub(crate) fn add_command(&mut self, command: SharedCommand) {
        self.commands.push(command);
    }

    pub(crate) fn remove_command(&mut self, command: &SharedCommand) -> bool {
        let target = Arc::as_ptr(command).cast::<()>();
        let before = self.commands.len();
        self.commands
            .retain(|owned| Arc::as_ptr(owned).cast::<()>() != target);
        self.commands.len() != before
    }

    pub(crate) fn clear_commands(&mut self) {
        self.commands.clear();
    }
}

impl Drop for RenderInfoCore {
    fn drop(&mut self) {
        if let Some(scene) = self.registered_scene() {
            scene.unregister(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = RenderInfoId::next();
        let b = RenderInfoId::next();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }

    #[test]
    fn test_registration_follows_visibility_and_scene() {
        let scene = VisualScene::new("main");
        let mut core = RenderInfoCore::new();
        let id = core.id();

        core.set_scene(Some(scene.clone()), None);
        assert!(scene.is_registered(id));

        core.set_visible(false, None);
        assert!(!scene.is_registered(id));

        // Scene changes while hidden do not register
        let other = VisualScene::new("other");
        core.set_scene(Some(other.clone()), None);
        assert!(!other.is_registered(id));

        core.set_visible(true, None);
        assert!(other.is_registered(id));
        assert!(!scene.is_registered(id));

        core.set_scene(Some(scene.clone()), None);
        assert!(scene.is_registered(id));
        assert!(!other.is_registered(id));

        drop(core);
        assert_eq!(scene.registered_count(), 0);
    }
}
