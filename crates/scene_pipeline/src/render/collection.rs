//! Double-buffered per-pass command buckets
//!
//! The update thread adds commands to the *updating* side while the render
//! thread drains the *rendering* side. [`RenderCommandCollection::swap_buffers`]
//! runs between frames, once both threads have finished, and exchanges the
//! two sides in constant time.
//!
//! Lock order: `updating` before `rendering`. Neither lock is held while a
//! command draws.

use std::collections::BTreeMap;
use std::fmt;
use std::mem;

use parking_lot::Mutex;

use super::command::{PassId, SharedCommand, SortKey};
use super::comparators::CommandComparator;
use crate::config::PassConfig;

/// Command queued with the sort key it had when it was added
struct Queued {
    key: SortKey,
    command: SharedCommand,
}

/// Commands queued for one pass
///
/// Adding appends. Ordered buckets sort once, at swap, on the keys captured
/// at add time, so a later collection of the same command into another
/// collection cannot reorder this one. The sort is stable: equal keys keep
/// insertion order.
struct Bucket {
    comparator: Option<CommandComparator>,
    entries: Vec<Queued>,
}

impl Bucket {
    fn new(comparator: Option<CommandComparator>) -> Self {
        Self {
            comparator,
            entries: Vec::new(),
        }
    }

    fn is_ordered(&self) -> bool {
        self.comparator.is_some()
    }

    fn insert(&mut self, command: SharedCommand) {
        self.entries.push(Queued {
            key: command.sort_key(),
            command,
        });
    }

    fn sort(&mut self) {
        if let Some(comparator) = &self.comparator {
            self.entries.sort_by(|a, b| comparator(a.key, b.key));
        }
    }
}

impl Clone for Bucket {
    /// Empty bucket with the same ordering
    fn clone(&self) -> Self {
        Self::new(self.comparator.clone())
    }
}

type Buckets = BTreeMap<PassId, Bucket>;

/// Per-pass render command buckets, double buffered
///
/// A collection is either a main collection or a shadow collection; the
/// flag is forwarded to every command hook. Passes render in ascending
/// [`PassId`] order.
pub struct RenderCommandCollection {
    shadow_pass: bool,
    updating: Mutex<Buckets>,
    rendering: Mutex<Buckets>,
}

impl RenderCommandCollection {
    /// Create a collection with no passes
    pub fn new(shadow_pass: bool) -> Self {
        Self {
            shadow_pass,
            updating: Mutex::new(BTreeMap::new()),
            rendering: Mutex::new(BTreeMap::new()),
        }
    }

    /// Create a collection from pass descriptions
    pub fn from_config(passes: &[PassConfig], shadow_pass: bool) -> Self {
        let mut collection = Self::new(shadow_pass);
        for pass in passes {
            log::debug!(
                "Configuring {} pass {} '{}' ({:?})",
                if shadow_pass { "shadow" } else { "main" },
                pass.id,
                pass.name,
                pass.sort
            );
            collection.configure(&[pass.id], pass.sort.comparator());
        }
        collection
    }

    /// Create buckets for `pass_ids` on both sides
    ///
    /// With a comparator the buckets are ordered, otherwise append-only.
    /// Configuring an existing pass replaces its buckets and drops whatever
    /// they held.
    pub fn configure(&mut self, pass_ids: &[PassId], comparator: Option<CommandComparator>) {
        let template = Bucket::new(comparator);
        let updating = self.updating.get_mut();
        let rendering = self.rendering.get_mut();
        for &pass in pass_ids {
            if updating.insert(pass, template.clone()).is_some() {
                log::debug!("Render pass {} reconfigured", pass);
            }
            rendering.insert(pass, template.clone());
        }
    }

    /// Whether this is a shadow collection
    pub fn is_shadow_pass(&self) -> bool {
        self.shadow_pass
    }

    /// Configured pass ids, ascending
    pub fn pass_ids(&self) -> Vec<PassId> {
        self.updating.lock().keys().copied().collect()
    }

    /// Whether `pass` has buckets
    pub fn is_configured(&self, pass: PassId) -> bool {
        self.updating.lock().contains_key(&pass)
    }

    /// Whether `pass` is an ordered pass
    pub fn is_ordered(&self, pass: PassId) -> bool {
        self.updating
            .lock()
            .get(&pass)
            .map_or(false, Bucket::is_ordered)
    }

    /// Queue a command into the updating bucket of its pass
    ///
    /// Returns `false` (and logs) when the command's pass is not configured;
    /// the command is dropped for this frame.
    pub fn add(&self, command: SharedCommand) -> bool {
        let pass = command.render_pass();
        let mut updating = self.updating.lock();
        match updating.get_mut(&pass) {
            Some(bucket) => {
                bucket.insert(command);
                true
            }
            None => {
                log::warn!("Render pass {} is not configured; command dropped", pass);
                false
            }
        }
    }

    /// Commit every queued command's state and make it renderable
    ///
    /// Ordered updating buckets are sorted, every command in them gets
    /// `swap_buffers`, leftovers
    /// in the rendering buckets are discarded, then the two sides trade
    /// places. Must only run while neither collection nor render is in
    /// progress.
    pub fn swap_buffers(&self) {
        let mut updating = self.updating.lock();
        let mut rendering = self.rendering.lock();

        for bucket in updating.values_mut() {
            bucket.sort();
            for queued in &bucket.entries {
                queued.command.swap_buffers(self.shadow_pass);
            }
        }

        for bucket in rendering.values_mut() {
            bucket.entries.clear();
        }

        mem::swap(&mut *updating, &mut *rendering);
    }

    /// Render the rendering bucket of `pass` in order, then clear it
    ///
    /// Disabled commands are skipped. Returns the number of commands drawn.
    pub fn render(&self, pass: PassId) -> usize {
        let mut entries = {
            let mut rendering = self.rendering.lock();
            match rendering.get_mut(&pass) {
                Some(bucket) => mem::take(&mut bucket.entries),
                None => {
                    log::warn!("Render pass {} is not configured; nothing to render", pass);
                    return 0;
                }
            }
        };

        let mut drawn = 0;
        for Queued { command, .. } in &entries {
            if command.is_enabled() {
                command.render(self.shadow_pass);
                drawn += 1;
            }
        }
        log::trace!("Rendered {} of {} commands in pass {}", drawn, entries.len(), pass);

        entries.clear();
        if let Some(bucket) = self.rendering.lock().get_mut(&pass) {
            if bucket.entries.is_empty() {
                bucket.entries = entries;
            }
        }
        drawn
    }

    /// Render every pass in ascending id order
    pub fn render_all(&self) -> usize {
        let passes: Vec<PassId> = self.rendering.lock().keys().copied().collect();
        passes.into_iter().map(|pass| self.render(pass)).sum()
    }

    /// Number of commands queued for the next frame in `pass`
    pub fn updating_len(&self, pass: PassId) -> usize {
        self.updating
            .lock()
            .get(&pass)
            .map_or(0, |bucket| bucket.entries.len())
    }

    /// Number of commands waiting to render in `pass`
    pub fn rendering_len(&self, pass: PassId) -> usize {
        self.rendering
            .lock()
            .get(&pass)
            .map_or(0, |bucket| bucket.entries.len())
    }
}

impl fmt::Debug for RenderCommandCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let updating = self.updating.lock();
        let counts: Vec<(PassId, usize)> = updating
            .iter()
            .map(|(pass, bucket)| (*pass, bucket.entries.len()))
            .collect();
        f.debug_struct("RenderCommandCollection")
            .field("shadow_pass", &self.shadow_pass)
            .field("updating", &counts)
            .finish()
    }
}
