//! Lazily recomputed matrix values
//!
//! A [`MatrixCache`] is the unit of caching used four times by every
//! transform node (local, world, inverse-local, inverse-world). The cached
//! value is valid if and only if the cache is not dirty; every read goes
//! through [`MatrixCache::get_or_update`], which recomputes first when needed.

use crate::foundation::math::Mat4;

/// Cached value with a dirty flag and a recompute counter
#[derive(Debug, Clone)]
pub struct MatrixCache<T = Mat4> {
    value: T,
    dirty: bool,
    recomputes: u64,
}

impl<T: Copy> MatrixCache<T> {
    /// Create a dirty cache holding a placeholder value
    ///
    /// The placeholder is never observable: the first read recomputes.
    pub fn new(placeholder: T) -> Self {
        Self {
            value: placeholder,
            dirty: true,
            recomputes: 0,
        }
    }

    /// Whether the next read will recompute
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Invalidate the cached value
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Cached value, or `None` while dirty
    pub fn cached(&self) -> Option<T> {
        (!self.dirty).then_some(self.value)
    }

    /// Number of times the value has been recomputed
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    /// Read the value, recomputing it first if dirty
    pub fn get_or_update(&mut self, recompute: impl FnOnce() -> T) -> T {
        if self.dirty {
            self.store(recompute());
        }
        self.value
    }

    /// Fallible variant of [`get_or_update`](Self::get_or_update)
    ///
    /// On error the cache stays dirty.
    pub fn try_get_or_update<E>(
        &mut self,
        recompute: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        if self.dirty {
            self.store(recompute()?);
        }
        Ok(self.value)
    }

    fn store(&mut self, value: T) {
        self.value = value;
        self.dirty = false;
        self.recomputes += 1;
    }
}

impl Default for MatrixCache<Mat4> {
    fn default() -> Self {
        Self::new(Mat4::identity())
    }
}
