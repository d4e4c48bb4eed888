//! Render info for 2D objects

use std::sync::Arc;

use super::camera::Camera;
use super::collection::RenderCommandCollection;
use super::command::SharedCommand;
use super::info::{RenderInfo, RenderInfoCore, RenderInfoId};
use crate::scene::{CullingVolume, Rect, VisualScene};

/// 2D render info clipped by rectangle
///
/// The camera volume passed to [`RenderInfo::allow_render`] acts as the clip
/// rectangle. An info without a rectangle is never clipped.
pub struct RenderInfo2D {
    core: RenderInfoCore,
    rect: Option<Rect>,
}

impl RenderInfo2D {
    /// Visible, unclipped, and not in any scene
    pub fn new() -> Self {
        Self {
            core: RenderInfoCore::new(),
            rect: None,
        }
    }

    /// Builder-style rectangle
    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.set_rect(Some(rect));
        self
    }

    /// Builder-style command
    pub fn with_command(mut self, command: SharedCommand) -> Self {
        self.add_command(command);
        self
    }

    /// Screen-space rectangle
    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    /// Replace the rectangle
    pub fn set_rect(&mut self, rect: Option<Rect>) {
        self.rect = rect;
        self.core.volume_changed(self.culling_volume());
    }

    /// Show or hide; registers in or unregisters from the scene
    pub fn set_visible(&mut self, visible: bool) {
        self.core.set_visible(visible, self.culling_volume());
    }

    /// Move to another scene, or detach with `None`
    pub fn set_scene(&mut self, scene: Option<Arc<VisualScene>>) {
        self.core.set_scene(scene, self.culling_volume());
    }

    /// Current scene
    pub fn scene(&self) -> Option<&Arc<VisualScene>> {
        self.core.scene()
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

impl Default for RenderInfo2D {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderInfo for RenderInfo2D {
    fn id(&self) -> RenderInfoId {
        self.core.id()
    }

    fn is_visible(&self) -> bool {
        self.core.is_visible()
    }

    fn culling_volume(&self) -> Option<CullingVolume> {
        self.rect.map(CullingVolume::Rect)
    }

    fn commands(&self) -> &[SharedCommand] {
        self.core.commands()
    }

    fn allow_render(
        &self,
        camera_volume: Option<&CullingVolume>,
        _passes: &RenderCommandCollection,
        _camera: Option<&Camera>,
    ) -> bool {
        if !self.is_visible() {
            return false;
        }
        match (camera_volume, self.rect) {
            (Some(clip), Some(rect)) => clip.intersects(&CullingVolume::Rect(rect)),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;
    use crate::render::command_2d::{Drawable2D, RenderCommand2D};

    struct Blank;

    impl Drawable2D for Blank {
        type State = ();

        fn draw(&self, _snapshot: &(), _shadow_pass: bool) {}
    }

    fn screen() -> CullingVolume {
        Rect::new(Vec2::new(0.0, 0.0), Vec2::new(800.0, 600.0)).into()
    }

    #[test]
    fn test_clip_rect() {
        let passes = RenderCommandCollection::new(false);
        let clip = screen();

        let on_screen = RenderInfo2D::new().with_rect(Rect::from_position_size(Vec2::new(10.0, 10.0), Vec2::new(32.0, 32.0)));
        let off_screen = RenderInfo2D::new().with_rect(Rect::from_position_size(Vec2::new(900.0, 10.0), Vec2::new(32.0, 32.0)));
        let unbounded = RenderInfo2D::new();

        assert!(on_screen.allow_render(Some(&clip), &passes, None));
        assert!(!off_screen.allow_render(Some(&clip), &passes, None));
        assert!(off_screen.allow_render(None, &passes, None));
        assert!(unbounded.allow_render(Some(&clip), &passes, None));
    }

    #[test]
    fn test_hidden_never_rendered() {
        let passes = RenderCommandCollection::new(false);
        let mut info = RenderInfo2D::new();
        info.set_visible(false);
        assert!(!info.allow_render(None, &passes, None));
    }

    #[test]
    fn test_commands_collected_in_z_order() {
        let mut passes = RenderCommandCollection::new(false);
        passes.configure(&[2], Some(crate::render::comparators::z_index_ascending()));

        let top = RenderCommand2D::shared(2, 10, Blank, ());
        let bottom = RenderCommand2D::shared(2, -3, Blank, ());
        let info = RenderInfo2D::new().with_command(top).with_command(bottom);

        assert_eq!(info.add_render_commands(&passes, None), 2);
        assert_eq!(passes.updating_len(2), 2);
    }

    #[test]
    fn test_registration_tracks_rect() {
        let scene = VisualScene::new("hud");
        let mut info = RenderInfo2D::new().with_rect(Rect::from_position_size(Vec2::new(10.0, 10.0), Vec2::new(8.0, 8.0)));
        let id = info.id();
        info.set_scene(Some(scene.clone()));

        let clip = screen();
        assert_eq!(scene.query_visible(Some(&clip)), vec![id]);

        info.set_rect(Some(Rect::from_position_size(Vec2::new(-100.0, -100.0), Vec2::new(8.0, 8.0))));
        assert!(scene.query_visible(Some(&clip)).is_empty());

        info.set_visible(false);
        assert_eq!(scene.registered_count(), 0);
    }
}
