//! Spatial index trait and a linear reference implementation
//!
//! The index only stores render-info ids with their culling volumes; the
//! render infos themselves stay with whoever owns them. Octrees, quadtrees
//! and BVHs plug in behind the same trait.

use std::collections::HashMap;

use super::bounds::CullingVolume;
use crate::render::RenderInfoId;

/// Trait for spatial data structures used to find visible render infos
///
/// An entry with a `None` volume is "always visible" and must be returned
/// by every query.
pub trait SpatialIndex: Send + Sync {
    /// Add an entry; re-adding replaces the previous volume
    fn add(&mut self, id: RenderInfoId, volume: Option<CullingVolume>);

    /// Remove an entry; returns whether it was present
    fn remove(&mut self, id: RenderInfoId) -> bool;

    /// Replace the volume of an existing entry; unknown ids are ignored
    fn update(&mut self, id: RenderInfoId, volume: Option<CullingVolume>);

    /// Whether an entry is present
    fn contains(&self, id: RenderInfoId) -> bool;

    /// Entries whose volume intersects `camera_volume`
    ///
    /// With no camera volume every entry is returned.
    fn query_visible(&self, camera_volume: Option<&CullingVolume>) -> Vec<RenderInfoId>;

    /// Number of entries
    fn len(&self) -> usize;

    /// Whether the index is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry
    fn clear(&mut self);
}

/// Simple list-based index (no spatial optimization)
///
/// Performs a linear scan for every query, which is fine for small scenes.
/// Results come back in insertion order.
#[derive(Debug, Default)]
pub struct SimpleListIndex {
    entries: Vec<(RenderInfoId, Option<CullingVolume>)>,
    positions: HashMap<RenderInfoId, usize>,
}

impl SimpleListIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpatialIndex for SimpleListIndex {
    fn add(&mut self, id: RenderInfoId, volume: Option<CullingVolume>) {
        if let Some(&position) = self.positions.get(&id) {
            self.entries[position].1 = volume;
            return;
        }
        self.positions.insert(id, self.entries.len());
        self.entries.push((id, volume));
    }

    fn remove(&mut self, id: RenderInfoId) -> bool {
        let Some(position) = self.positions.remove(&id) else {
            return false;
        };
        self.entries.remove(position);
        for (index, (entry_id, _)) in self.entries.iter().enumerate().skip(position) {
            self.positions.insert(*entry_id, index);
        }
        true
    }

    fn update(&mut self, id: RenderInfoId, volume: Option<CullingVolume>) {
        if let Some(&position) = self.positions.get(&id) {
            self.entries[position].1 = volume;
        }
    }

    fn contains(&self, id: RenderInfoId) -> bool {
        self.positions.contains_key(&id)
    }

    fn query_visible(&self, camera_volume: Option<&CullingVolume>) -> Vec<RenderInfoId> {
        self.entries
            .iter()
            .filter(|(_, volume)| match (camera_volume, volume) {
                (Some(camera), Some(volume)) => camera.intersects(volume),
                _ => true,
            })
            .map(|(id, _)| *id)
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::scene::bounds::AABB;

    fn unit_box(center: Vec3) -> Option<CullingVolume> {
        Some(AABB::from_center_extents(center, Vec3::repeat(1.0)).into())
    }

    #[test]
    fn test_add_remove() {
        let mut index = SimpleListIndex::new();
        let a = RenderInfoId::next();
        let b = RenderInfoId::next();

        index.add(a, unit_box(Vec3::zeros()));
        index.add(b, None);
        index.add(a, unit_box(Vec3::x()));
        assert_eq!(index.len(), 2);

        assert!(index.remove(a));
        assert!(!index.remove(a));
        assert!(!index.contains(a));
        assert!(index.contains(b));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_query_visible_filters_by_volume() {
        let mut index = SimpleListIndex::new();
        let near = RenderInfoId::next();
        let far = RenderInfoId::next();
        let always = RenderInfoId::next();

        index.add(near, unit_box(Vec3::zeros()));
        index.add(far, unit_box(Vec3::new(100.0, 0.0, 0.0)));
        index.add(always, None);

        let camera: CullingVolume = AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(10.0)).into();
        assert_eq!(index.query_visible(Some(&camera)), vec![near, always]);
        assert_eq!(index.query_visible(None), vec![near, far, always]);

        index.update(far, unit_box(Vec3::new(5.0, 0.0, 0.0)));
        assert_eq!(index.query_visible(Some(&camera)), vec![near, far, always]);
    }

    #[test]
    fn test_remove_keeps_positions_consistent() {
        let mut index = SimpleListIndex::new();
        let ids: Vec<_> = (0..4).map(|_| RenderInfoId::next()).collect();
        for id in &ids {
            index.add(*id, None);
        }

        index.remove(ids[1]);
        index.update(ids[3], unit_box(Vec3::zeros()));
        index.remove(ids[2]);

        assert_eq!(index.query_visible(None), vec![ids[0], ids[3]]);
        index.clear();
        assert!(index.is_empty());
    }
}
