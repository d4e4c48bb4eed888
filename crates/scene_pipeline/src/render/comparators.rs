//! Pass ordering functions
//!
//! A comparator orders the sort keys an ordered pass captured when its
//! commands were added. Equal keys keep their insertion order.

use std::cmp::Ordering;
use std::sync::Arc;

use super::command::SortKey;

/// Ordering function attached to an ordered pass
pub type CommandComparator = Arc<dyn Fn(SortKey, SortKey) -> Ordering + Send + Sync>;

/// [`SortKey::compare`], the same order as the default [`RenderCommand::compare`](super::RenderCommand::compare)
pub fn natural() -> CommandComparator {
    Arc::new(|a: SortKey, b: SortKey| a.compare(b))
}

/// Ascending z-index (2D back-to-front layering)
pub fn z_index_ascending() -> CommandComparator {
    Arc::new(|a: SortKey, b: SortKey| a.z_index().cmp(&b.z_index()))
}

/// Ascending camera distance (opaque geometry)
pub fn near_to_far() -> CommandComparator {
    Arc::new(|a: SortKey, b: SortKey| a.depth().total_cmp(&b.depth()))
}

/// Descending camera distance (transparent geometry)
pub fn far_to_near() -> CommandComparator {
    Arc::new(|a: SortKey, b: SortKey| b.depth().total_cmp(&a.depth()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_comparators_are_mirrored() {
        let near = SortKey::Depth(1.0);
        let far = SortKey::Depth(9.0);

        assert_eq!(near_to_far()(near, far), Ordering::Less);
        assert_eq!(far_to_near()(near, far), Ordering::Greater);
        assert_eq!(near_to_far()(far, far), Ordering::Equal);
    }

    #[test]
    fn test_natural_matches_sort_key_order() {
        let keys = [SortKey::Depth(0.5), SortKey::Unkeyed, SortKey::ZIndex(4)];
        let natural = natural();
        for a in keys {
            for b in keys {
                assert_eq!(natural(a, b), a.compare(b));
            }
        }
        assert_eq!(z_index_ascending()(SortKey::ZIndex(-2), SortKey::ZIndex(3)), Ordering::Less);
    }
}
