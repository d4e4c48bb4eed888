//! Math utilities and types
//!
//! Provides the fundamental math types used by the transform hierarchy and
//! the render pipeline, plus the checked inversion used by the inverse caches.

use nalgebra::{Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Determinant magnitude below which a matrix is treated as singular
pub const INVERSION_EPSILON: f32 = 1e-6;

/// Invert a 4x4 matrix, refusing near-singular input
///
/// Returns `None` when `|det| < INVERSION_EPSILON`. NaN input is not
/// rejected here: its determinant is NaN, so the NaN propagates into the
/// result instead of being masked as a singular matrix.
pub fn try_invert(matrix: &Mat4) -> Option<Mat4> {
    if matrix.determinant().abs() < INVERSION_EPSILON {
        return None;
    }
    matrix.try_inverse()
}

/// Extract the translation column of an affine matrix
pub fn translation_of(matrix: &Mat4) -> Vec3 {
    Vec3::new(matrix.m14, matrix.m24, matrix.m34)
}

/// Math utility functions
pub mod utils {
    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees.to_radians()
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a perspective projection matrix with [0, 1] depth
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create a look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Flip Y and Z so right-handed Y-up view space matches the
    /// Y-down, Z-forward clip convention of `perspective`
    fn clip_coordinate_transform() -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        // P = [a⁻¹/tan(φ/2)    0              0          0          ]
        //     [0               1/tan(φ/2)     0          0          ]
        //     [0               0              f/(f-n)    -nf/(f-n)  ]
        //     [0               0              1          0          ]
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (far - near);
        result[(2, 3)] = -(near * far) / (far - near);
        result[(3, 2)] = 1.0;
        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }

    fn clip_coordinate_transform() -> Mat4 {
        Mat4::new(
            1.0,  0.0,  0.0, 0.0,
            0.0, -1.0,  0.0, 0.0,
            0.0,  0.0, -1.0, 0.0,
            0.0,  0.0,  0.0, 1.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_try_invert_round_trip() {
        let m = Mat4::new_translation(&Vec3::new(1.0, -2.0, 3.0))
            * Mat4::from_axis_angle(&Vec3::y_axis(), 0.7)
            * Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 0.5, 1.5));

        let inverse = try_invert(&m).expect("matrix is invertible");
        assert_relative_eq!(m * inverse, Mat4::identity(), epsilon = 1e-5);
    }

    #[test]
    fn test_try_invert_rejects_singular() {
        let flat = Mat4::new_nonuniform_scaling(&Vec3::new(1.0, 0.0, 1.0));
        assert!(try_invert(&flat).is_none());

        let tiny = Mat4::new_scaling(1e-3);
        assert!(try_invert(&tiny).is_none(), "det 1e-9 is below the threshold");
    }

    #[test]
    fn test_deg_to_rad() {
        assert_relative_eq!(utils::deg_to_rad(180.0), std::f32::consts::PI);
        assert_relative_eq!(utils::deg_to_rad(-90.0), -std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn test_translation_of() {
        let m = Mat4::new_translation(&Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(translation_of(&m), Vec3::new(4.0, 5.0, 6.0));
    }
}
