//! Composition order of the local transform
//!
//! A local matrix is the product of a scale, a rotation and a translation
//! matrix. The six permutations are named by their left-to-right product, so
//! [`CompositionOrder::Trs`] is `T * R * S` (scale applied first to column
//! vectors), which is also the default.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Mat4, Quat, Vec3};

/// Function composing a local matrix from its scale, rotation and translation parts
pub type ComposeFn = fn(scale: &Mat4, rotation: &Mat4, translation: &Mat4) -> Mat4;

/// Multiplication order of the scale (S), rotation (R) and translation (T) matrices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CompositionOrder {
    /// `S * R * T`
    Srt,
    /// `S * T * R`
    Str,
    /// `R * S * T`
    Rst,
    /// `R * T * S`
    Rts,
    /// `T * S * R`
    Tsr,
    /// `T * R * S`
    #[default]
    Trs,
}

const COMPOSERS: [ComposeFn; 6] = [
    |s, r, t| s * r * t,
    |s, r, t| s * t * r,
    |s, r, t| r * s * t,
    |s, r, t| r * t * s,
    |s, r, t| t * s * r,
    |s, r, t| t * r * s,
];

impl CompositionOrder {
    /// All orders, in dispatch-table order
    pub const ALL: [Self; 6] = [Self::Srt, Self::Str, Self::Rst, Self::Rts, Self::Tsr, Self::Trs];

    /// Composition function for this order
    ///
    /// Looked up once when a node's order changes, so building a matrix
    /// never branches on the order.
    pub fn composer(self) -> ComposeFn {
        COMPOSERS[self as usize]
    }

    /// Build a local matrix from SRT components with this order
    pub fn compose(self, scale: &Vec3, rotation: &Quat, translation: &Vec3) -> Mat4 {
        compose_with(self.composer(), scale, rotation, translation)
    }
}

/// Build a local matrix with an already resolved composition function
pub fn compose_with(compose: ComposeFn, scale: &Vec3, rotation: &Quat, translation: &Vec3) -> Mat4 {
    compose(
        &Mat4::new_nonuniform_scaling(scale),
        &rotation.to_homogeneous(),
        &Mat4::new_translation(translation),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::translation_of;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_is_trs() {
        let order = CompositionOrder::default();
        let scale = Vec3::new(2.0, 2.0, 2.0);
        let translation = Vec3::new(1.0, 0.0, 0.0);
        let m = order.compose(&scale, &Quat::identity(), &translation);

        // TRS keeps translation unscaled
        assert_relative_eq!(translation_of(&m), translation, epsilon = 1e-6);
    }

    #[test]
    fn test_srt_scales_translation() {
        let scale = Vec3::new(2.0, 3.0, 4.0);
        let translation = Vec3::new(1.0, 1.0, 1.0);
        let m = CompositionOrder::Srt.compose(&scale, &Quat::identity(), &translation);

        assert_relative_eq!(translation_of(&m), Vec3::new(2.0, 3.0, 4.0), epsilon = 1e-6);
    }

    #[test]
    fn test_dispatch_table_matches_names() {
        let s = Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 1.0, 0.5));
        let r = Quat::from_euler_angles(0.3, 0.2, 0.1).to_homogeneous();
        let t = Mat4::new_translation(&Vec3::new(1.0, -2.0, 3.0));

        let expected = [s * r * t, s * t * r, r * s * t, r * t * s, t * s * r, t * r * s];
        for (order, want) in CompositionOrder::ALL.iter().zip(expected.iter()) {
            assert_relative_eq!((order.composer())(&s, &r, &t), *want, epsilon = 1e-6);
        }
    }
}
