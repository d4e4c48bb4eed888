//! Bounding volumes used for visibility culling
//!
//! 3D objects cull against a camera [`Frustum`] with an [`AABB`] or a
//! [`BoundingSphere`]; 2D objects cull against a clip [`Rect`]. The
//! [`CullingVolume`] enum wraps all of them so render infos and spatial
//! indices can treat "some shape" uniformly.

use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};

/// Axis-Aligned Bounding Box for spatial queries
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Check if this AABB intersects a sphere
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        let closest = sphere.center.sup(&self.min).inf(&self.max);
        (closest - sphere.center).magnitude_squared() <= sphere.radius * sphere.radius
    }

    /// Bounding box of this box after an affine transform
    ///
    /// Transforms all eight corners, so the result stays conservative under
    /// rotation.
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        let mut min = Vec3::repeat(f32::INFINITY);
        let mut max = Vec3::repeat(f32::NEG_INFINITY);
        for corner in 0..8 {
            let local = Vec4::new(
                if corner & 1 == 0 { self.min.x } else { self.max.x },
                if corner & 2 == 0 { self.min.y } else { self.max.y },
                if corner & 4 == 0 { self.min.z } else { self.max.z },
                1.0,
            );
            let world = (matrix * local).xyz();
            min = min.inf(&world);
            max = max.sup(&world);
        }
        AABB { min, max }
    }
}

/// Sphere bound, cheaper to test than a box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Sphere center
    pub center: Vec3,
    /// Sphere radius
    pub radius: f32,
}

impl BoundingSphere {
    /// Create a sphere
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if two spheres overlap
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let reach = self.radius + other.radius;
        (self.center - other.center).magnitude_squared() <= reach * reach
    }
}

/// Screen-space rectangle used by 2D culling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Top-left corner
    pub min: Vec2,
    /// Bottom-right corner
    pub max: Vec2,
}

impl Rect {
    /// Create a rectangle from two corners
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create a rectangle from its top-left corner and size
    pub fn from_position_size(position: Vec2, size: Vec2) -> Self {
        Self {
            min: position,
            max: position + size,
        }
    }

    /// Check if this rectangle overlaps another
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y
    }

    /// Check if a point lies inside the rectangle
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y
    }
}

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (should be normalized)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal: normal.normalize(), distance }
    }

    /// Plane `a*x + b*y + c*z + d = 0`, normalized so distances are metric
    ///
    /// A degenerate coefficient row is kept as-is.
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.xyz();
        let length = normal.magnitude();
        if length > f32::EPSILON {
            Self { normal: normal / length, distance: coefficients.w / length }
        } else {
            Self { normal, distance: coefficients.w }
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb-Hartmann extraction for clip space with `-w <= x, y <= w` and
    /// `0 <= z <= w`, matching [`Mat4Ext::perspective`](crate::foundation::math::Mat4Ext::perspective).
    /// Plane normals point into the frustum.
    pub fn from_matrix(vp_matrix: &Mat4) -> Self {
        let row = |i: usize| vp_matrix.row(i).transpose();
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Check if a point is inside the frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|plane| plane.distance_to_point(point) >= 0.0)
    }

    /// Check if an AABB is inside or intersects the frustum
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        // For each plane, check if the AABB is completely outside
        for plane in &self.planes {
            // Corner of the box furthest along the plane normal
            let mut p = aabb.min;
            if plane.normal.x >= 0.0 { p.x = aabb.max.x; }
            if plane.normal.y >= 0.0 { p.y = aabb.max.y; }
            if plane.normal.z >= 0.0 { p.z = aabb.max.z; }

            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }

        true
    }

    /// Check if a sphere is inside or intersects the frustum
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(sphere.center) >= -sphere.radius)
    }
}

/// Any shape that can take part in a visibility test
#[derive(Debug, Clone, PartialEq)]
pub enum CullingVolume {
    /// Axis-aligned box
    Aabb(AABB),
    /// Sphere
    Sphere(BoundingSphere),
    /// Camera frustum
    Frustum(Frustum),
    /// 2D clip or object rectangle
    Rect(Rect),
}

impl CullingVolume {
    /// Whether two volumes overlap
    ///
    /// Pairs without an exact test (frustum/frustum, 2D against 3D) answer
    /// `true`: an untestable object is drawn rather than dropped.
    pub fn intersects(&self, other: &CullingVolume) -> bool {
        use CullingVolume::{Aabb, Frustum, Rect, Sphere};

        match (self, other) {
            (Aabb(a), Aabb(b)) => a.intersects(b),
            (Aabb(a), Sphere(s)) | (Sphere(s), Aabb(a)) => a.intersects_sphere(s),
            (Sphere(a), Sphere(b)) => a.intersects(b),
            (Frustum(f), Aabb(a)) | (Aabb(a), Frustum(f)) => f.intersects_aabb(a),
            (Frustum(f), Sphere(s)) | (Sphere(s), Frustum(f)) => f.intersects_sphere(s),
            (Rect(a), Rect(b)) => a.intersects(b),
            _ => true,
        }
    }
}

impl From<AABB> for CullingVolume {
    fn from(aabb: AABB) -> Self {
        Self::Aabb(aabb)
    }
}

impl From<BoundingSphere> for CullingVolume {
    fn from(sphere: BoundingSphere) -> Self {
        Self::Sphere(sphere)
    }
}

impl From<Frustum> for CullingVolume {
    fn from(frustum: Frustum) -> Self {
        Self::Frustum(frustum)
    }
}

impl From<Rect> for CullingVolume {
    fn from(rect: Rect) -> Self {
        Self::Rect(rect)
    }
}
