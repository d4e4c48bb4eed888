//! # 3D Camera
//!
//! Supplies the two things the pipeline core needs from a camera: a world
//! position for distance sort keys, and a frustum for visibility tests.
//!
//! ## Design Principles
//! - **Library-agnostic**: No graphics API dependencies in camera math
//! - **On-demand matrices**: View and projection are computed when asked
//! - **Conventions**: Right-handed Y-up view space, [0, 1] clip depth

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::scene::{CullingVolume, Frustum};

/// Perspective camera
///
/// # Coordinate System
/// Uses standard right-handed Y-up coordinate system in view space:
/// - X+ = Right
/// - Y+ = Up
/// - The camera looks from `position` towards `target`
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Field of view angle in radians
    pub fov: f32,

    /// Aspect ratio (width / height) for projection calculations
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a new perspective camera with standard Y-up orientation
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Field of view angle in degrees (converted to radians internally)
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    ///
    /// # Example
    /// ```rust
    /// use scene_pipeline::foundation::math::Vec3;
    /// use scene_pipeline::render::Camera;
    ///
    /// let camera = Camera::perspective(
    ///     Vec3::new(0.0, 2.0, 5.0),
    ///     75.0,
    ///     16.0 / 9.0,
    ///     0.1,
    ///     100.0
    /// );
    /// assert!(camera.frustum().contains_point(Vec3::zeros()));
    /// ```
    ///
    /// The default target is the origin and the up vector is +Y.
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Update camera position in world space
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Update camera target (look-at point)
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        log::trace!("Camera target updated to: {:?}", target);
    }

    /// Configure camera to look at a specific point with custom up vector
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// Update camera aspect ratio for viewport changes
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            log::debug!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// World-to-camera matrix
    pub fn get_view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// Perspective projection matrix
    pub fn get_projection_matrix(&self) -> Mat4 {
        Mat4::perspective(self.fov, self.aspect, self.near, self.far)
    }

    /// Combined view-projection matrix: P × X × V
    ///
    /// X flips view space into the clip convention expected by the
    /// projection matrix.
    pub fn get_view_projection_matrix(&self) -> Mat4 {
        self.get_projection_matrix() * Mat4::clip_coordinate_transform() * self.get_view_matrix()
    }

    /// View frustum in world space
    pub fn frustum(&self) -> Frustum {
        Frustum::from_matrix(&self.get_view_projection_matrix())
    }

    /// Frustum wrapped as a culling volume for `RenderInfo::allow_render`
    pub fn culling_volume(&self) -> CullingVolume {
        CullingVolume::Frustum(self.frustum())
    }

    /// Squared distance from the camera to a world position
    pub fn distance_squared_to(&self, point: &Vec3) -> f32 {
        (point - self.position).magnitude_squared()
    }
}

impl Default for Camera {
    /// Perspective camera above and behind the origin, looking at it
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 3.0, 3.0),
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::FRAC_PI_4,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}
