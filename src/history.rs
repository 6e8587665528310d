use std::collections::VecDeque;

use log::debug;

use crate::backend::{GlyphHandle, RenderBackend};
use crate::glyph::{Glyph, GlyphFactory};
use crate::types::PoseSample;
use crate::uncertainty::UncertaintyVisual;

/// Preallocation cap for large keep counts
const MAX_PREALLOCATED: usize = 1024;

/// Monotonic write-cursor position of an entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u64);

/// An accepted sample together with the resources drawing it
#[derive(Debug)]
pub struct RetainedEntry {
    pub id: EntryId,
    pub sample: PoseSample,
    /// `None` when glyph construction failed
    pub glyph: Option<Glyph>,
    pub uncertainty: UncertaintyVisual,
}

impl RetainedEntry {
    /// Every backend resource owned by this entry
    pub fn handles(&self) -> impl Iterator<Item = GlyphHandle> + '_ {
        self.glyph
            .iter()
            .map(|g| g.handle())
            .chain(self.uncertainty.handles())
    }

    fn release<B: RenderBackend>(self, factory: &mut GlyphFactory<B>) -> PoseSample {
        if let Some(glyph) = self.glyph {
            factory.destroy(glyph);
        }
        for handle in self.uncertainty.handles() {
            factory.destroy_handle(handle);
        }
        self.sample
    }
}

/// Bounded oldest-to-newest history of retained entries
///
/// Overflow always evicts from the old end, never rejects the newest entry.
/// A capacity of 0 means unbounded.
#[derive(Debug)]
pub struct HistoryStore {
    entries: VecDeque<RetainedEntry>,
    capacity: usize,
    write_cursor: u64,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        HistoryStore {
            entries: VecDeque::with_capacity(capacity.min(MAX_PREALLOCATED)),
            capacity,
            write_cursor: 0,
        }
    }

    /// Append at the new end, then evict from the old end while over capacity
    pub fn push<B: RenderBackend>(
        &mut self,
        sample: PoseSample,
        glyph: Option<Glyph>,
        uncertainty: UncertaintyVisual,
        factory: &mut GlyphFactory<B>,
    ) -> EntryId {
        let id = EntryId(self.write_cursor);
        self.write_cursor += 1;
        self.entries.push_back(RetainedEntry {
            id,
            sample,
            glyph,
            uncertainty,
        });
        self.evict_overflow(factory);
        id
    }

    /// Destroy every entry and its glyphs
    pub fn clear<B: RenderBackend>(&mut self, factory: &mut GlyphFactory<B>) {
        self.drain_samples(factory);
    }

    /// Destroy every entry's glyphs, handing back the samples oldest first
    pub fn drain_samples<B: RenderBackend>(
        &mut self,
        factory: &mut GlyphFactory<B>,
    ) -> Vec<PoseSample> {
        self.entries
            .drain(..)
            .map(|entry| entry.release(factory))
            .collect()
    }

    pub fn resize_capacity<B: RenderBackend>(
        &mut self,
        new_max: usize,
        factory: &mut GlyphFactory<B>,
    ) {
        self.capacity = new_max;
        self.evict_overflow(factory);
    }

    /// Visit entries oldest to newest
    pub fn for_each(&self, f: impl FnMut(&RetainedEntry)) {
        self.entries.iter().for_each(f);
    }

    /// Visit entries oldest to newest with mutable access to their visuals
    pub fn for_each_mut(&mut self, f: impl FnMut(&mut RetainedEntry)) {
        self.entries.iter_mut().for_each(f);
    }

    pub fn iter(&self) -> impl Iterator<Item = &RetainedEntry> {
        self.entries.iter()
    }

    pub fn newest(&self) -> Option<&RetainedEntry> {
        self.entries.back()
    }

    pub fn oldest(&self) -> Option<&RetainedEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict_overflow<B: RenderBackend>(&mut self, factory: &mut GlyphFactory<B>) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() > self.capacity {
            if let Some(entry) = self.entries.pop_front() {
                debug!("evicting entry {:?}", entry.id);
                entry.release(factory);
            }
        }
    }
}
