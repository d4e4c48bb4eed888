//! Render info for 3D objects

use std::sync::Arc;

use super::camera::Camera;
use super::collection::RenderCommandCollection;
use super::command::SharedCommand;
use super::info::{RenderInfo, RenderInfoCore, RenderInfoId};
use crate::scene::{CullingVolume, VisualScene};

/// 3D render info with frustum culling and shadow casting
///
/// Collected when it is visible, the collection is not a shadow collection
/// or the object casts shadows, and its culling volume (if any) meets the
/// camera volume (if any).
pub struct RenderInfo3D {
    core: RenderInfoCore,
    culling_volume: Option<CullingVolume>,
    casts_shadows: bool,
}

impl RenderInfo3D {
    /// Visible, shadow casting, unbounded, and not in any scene
    pub fn new() -> Self {
        Self {
            core: RenderInfoCore::new(),
            culling_volume: None,
            casts_shadows: true,
        }
    }

    /// Builder-style culling volume
    pub fn with_culling_volume(mut self, volume: impl Into<CullingVolume>) -> Self {
        self.set_culling_volume(Some(volume.into()));
        self
    }

    /// Builder-style command
    pub fn with_command(mut self, command: SharedCommand) -> Self {
        self.add_command(command);
        self
    }

    /// Show or hide; registers in or unregisters from the scene
    pub fn set_visible(&mut self, visible: bool) {
        self.core.set_visible(visible, self.culling_volume.clone());
    }

    /// Move to another scene, or detach with `None`
    pub fn set_scene(&mut self, scene: Option<Arc<VisualScene>>) {
        self.core.set_scene(scene, self.culling_volume.clone());
    }

    /// Current scene
    pub fn scene(&self) -> Option<&Arc<VisualScene>> {
        self.core.scene()
    }

    /// Replace the culling volume, `None` meaning always visible
    pub fn set_culling_volume(&mut self, volume: Option<CullingVolume>) {
        self.culling_volume = volume;
        self.core.volume_changed(self.culling_volume.clone());
    }

    /// Whether the object is collected into shadow collections
    pub fn casts_shadows(&self) -> bool {
        self.casts_shadows
    }

    /// Set shadow casting
    pub fn set_casts_shadows(&mut self, casts_shadows: bool) {
        self.casts_shadows = casts_shadows;
    }

    /// Attach a command
    pub fn add_command(&mut self, command: SharedCommand) {
        self.core.add_command(command);
    }

    /// Detach a command by identity
    pub fn remove_command(&mut self, command: &SharedCommand) -> bool {
        self.core.remove_command(command)
    }

    /// Detach every command
    pub fn clear_commands(&mut self) {
        self.core.clear_commands();
    }
}

impl Default for RenderInfo3D {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderInfo for RenderInfo3D {
    fn id(&self) -> RenderInfoId {
        self.core.id()
    }

    fn is_visible(&self) -> bool {
        self.core.is_visible()
    }

    fn culling_volume(&self) -> Option<CullingVolume> {
        self.culling_volume.clone()
    }

    fn commands(&self) -> &[SharedCommand] {
        self.core.commands()
    }

    fn allow_render(
        &self,
        camera_volume: Option<&CullingVolume>,
        passes: &RenderCommandCollection,
        _camera: Option<&Camera>,
    ) -> bool {
        if !self.is_visible() {
            return false;
        }
        if passes.is_shadow_pass() && !self.casts_shadows {
            return false;
        }
        match (&self.culling_volume, camera_volume) {
            (Some(volume), Some(camera_volume)) => camera_volume.intersects(volume),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::command::RenderCommand;
    use crate::render::command_3d::{Drawable3D, RenderCommand3D};
    use crate::scene::AABB;

    struct Nothing;

    impl Drawable3D for Nothing {
        type State = Vec3;

        fn world_position(&self, state: &Vec3) -> Vec3 {
            *state
        }

        fn draw(&self, _snapshot: &Vec3, _shadow_pass: bool) {}
    }

    fn camera_volume() -> CullingVolume {
        Camera::perspective(Vec3::new(0.0, 0.0, 10.0), 60.0, 1.0, 0.1, 100.0).culling_volume()
    }

    fn bounded_at(center: Vec3) -> RenderInfo3D {
        RenderInfo3D::new().with_culling_volume(AABB::from_center_extents(center, Vec3::repeat(0.5)))
    }

    #[test]
    fn test_culling_against_camera_volume() {
        let main = RenderCommandCollection::new(false);
        let camera = camera_volume();

        assert!(bounded_at(Vec3::zeros()).allow_render(Some(&camera), &main, None));
        assert!(!bounded_at(Vec3::new(0.0, 0.0, 50.0)).allow_render(Some(&camera), &main, None));

        // No camera volume, or no own volume: never culled
        assert!(bounded_at(Vec3::new(0.0, 0.0, 50.0)).allow_render(None, &main, None));
        assert!(RenderInfo3D::new().allow_render(Some(&camera), &main, None));
    }

    #[test]
    fn test_hidden_and_shadow_rules() {
        let main = RenderCommandCollection::new(false);
        let shadow = RenderCommandCollection::new(true);

        let mut info = RenderInfo3D::new();
        assert!(info.allow_render(None, &shadow, None));

        info.set_casts_shadows(false);
        assert!(!info.allow_render(None, &shadow, None));
        assert!(info.allow_render(None, &main, None));

        info.set_visible(false);
        assert!(!info.allow_render(None, &main, None));
    }

    #[test]
    fn test_add_render_commands_skips_disabled() {
        let mut main = RenderCommandCollection::new(false);
        main.configure(&[0], None);

        let enabled = RenderCommand3D::shared(0, Nothing, Vec3::new(2.0, 0.0, 0.0));
        let disabled = RenderCommand3D::shared(0, Nothing, Vec3::zeros());
        let stray = RenderCommand3D::shared(9, Nothing, Vec3::zeros());
        disabled.set_enabled(false);

        let info = RenderInfo3D::new()
            .with_command(enabled.clone())
            .with_command(disabled)
            .with_command(stray);

        let camera = Camera::perspective(Vec3::zeros(), 60.0, 1.0, 0.1, 100.0);
        assert_eq!(info.add_render_commands(&main, Some(&camera)), 1);
        assert_eq!(main.updating_len(0), 1);
        assert_eq!(enabled.distance_squared(), 4.0);
    }

    #[test]
    fn test_remove_command_by_identity() {
        let first: SharedCommand = RenderCommand3D::shared(0, Nothing, Vec3::zeros());
        let second: SharedCommand = RenderCommand3D::shared(0, Nothing, Vec3::zeros());

        let mut info = RenderInfo3D::new()
            .with_command(first.clone())
            .with_command(second.clone());

        assert!(info.remove_command(&first));
        assert!(!info.remove_command(&first));
        assert_eq!(info.commands().len(), 1);

        info.clear_commands();
        assert!(info.commands().is_empty());
        drop(second);
    }

    #[test]
    fn test_registered_iff_visible() {
        let scene = VisualScene::new("world");
        let mut info = bounded_at(Vec3::zeros());
        let id = info.id();

        assert!(!scene.is_registered(id));
        info.set_scene(Some(scene.clone()));
        assert!(scene.is_registered(id));

        info.set_visible(false);
        assert!(!scene.is_registered(id));
        info.set_visible(true);
        assert!(scene.is_registered(id));

        // Moving the volume updates the index entry
        let camera = camera_volume();
        assert_eq!(scene.query_visible(Some(&camera)), vec![id]);
        info.set_culling_volume(Some(AABB::from_center_extents(Vec3::new(0.0, 0.0, 50.0), Vec3::repeat(0.5)).into()));
        assert!(scene.query_visible(Some(&camera)).is_empty());

        info.set_scene(None);
        assert!(!scene.is_registered(id));

        info.set_scene(Some(scene.clone()));
        drop(info);
        assert!(!scene.is_registered(id));
    }
}
