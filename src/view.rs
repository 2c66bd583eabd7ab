//! View registry and the bookkeeping shared by both engines.
//!
//! A root list owns a slab of view records. Handles are `(slot, generation)`
//! pairs: disposing a view frees its slot and bumps the generation, so a
//! stale handle can never reach a recycled record. Records are never
//! aliased; every read and fix-up goes through the registry.
//!
//! ```text
//! root ──owns──► Registry ──slot──► Record { bounds, live }
//!                    ▲
//!        ViewId { slot, generation }   (plain index, no back-pointer)
//! ```

use tracing::debug;
use tracing::trace;

use crate::error::Error;
use crate::error::Result;

/// Handle to a view of a list. Cheap to copy; checked on every use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewId {
    slot: u32,
    generation: u32,
}

impl ViewId {
    /// Slot index inside the owning registry.
    pub fn slot(&self) -> u32 {
        return self.slot;
    }
}

/// Lifecycle of a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewState {
    /// Registered and denoting a valid range.
    Live,
    /// A structural change made the range unrepresentable.
    Invalidated,
    /// Released. Terminal.
    Disposed,
}

/// What an operation is addressed to: the whole list or one live view slot.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Root,
    View(u32),
}

impl Scope {
    #[inline]
    pub(crate) fn is_view(&self, slot: u32) -> bool {
        return *self == Scope::View(slot);
    }
}

/// A registered view.
#[derive(Clone, Debug)]
pub(crate) struct Record<B> {
    pub(crate) bounds: B,
    pub(crate) live: bool,
}

#[derive(Clone, Debug)]
struct Entry<B> {
    generation: u32,
    record: Option<Record<B>>,
}

/// Generational slab of view records.
#[derive(Clone, Debug)]
pub(crate) struct Registry<B> {
    entries: Vec<Entry<B>>,
    free: Vec<u32>,
    live: usize,
}

impl<B> Registry<B> {
    pub(crate) fn new() -> Registry<B> {
        return Registry {
            entries: Vec::new(),
            free: Vec::new(),
            live: 0,
        };
    }

    /// Number of live records.
    #[inline]
    pub(crate) fn live(&self) -> usize {
        return self.live;
    }

    pub(crate) fn register(&mut self, bounds: B) -> ViewId {
        let record = Some(Record { bounds, live: true });
        self.live += 1;
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.entries[slot as usize];
            entry.record = record;
            trace!(slot, generation = entry.generation, "view registered");
            return ViewId { slot, generation: entry.generation };
        }
        let slot = self.entries.len() as u32;
        self.entries.push(Entry { generation: 0, record });
        trace!(slot, generation = 0, "view registered");
        return ViewId { slot, generation: 0 };
    }

    pub(crate) fn state(&self, id: ViewId) -> ViewState {
        match self.entries.get(id.slot as usize) {
            Some(Entry { generation, record: Some(record) }) if *generation == id.generation => {
                if record.live {
                    return ViewState::Live;
                }
                return ViewState::Invalidated;
            }
            _ => return ViewState::Disposed,
        }
    }

    /// Resolves a handle to the slot of a live record.
    pub(crate) fn resolve(&self, id: ViewId) -> Result<u32> {
        match self.state(id) {
            ViewState::Live => return Ok(id.slot),
            ViewState::Invalidated => return Err(Error::Invalidated),
            ViewState::Disposed => return Err(Error::Disposed),
        }
    }

    /// Bounds of a live slot. Slots come from `resolve`, so a miss is a bug.
    #[inline]
    pub(crate) fn bounds(&self, slot: u32) -> &B {
        return match &self.entries[slot as usize].record {
            Some(record) => &record.bounds,
            None => panic!("view slot {} is not registered", slot),
        };
    }

    #[inline]
    pub(crate) fn bounds_mut(&mut self, slot: u32) -> &mut B {
        return match &mut self.entries[slot as usize].record {
            Some(record) => &mut record.bounds,
            None => panic!("view slot {} is not registered", slot),
        };
    }

    /// Marks a live record invalidated. Its handle keeps reporting
    /// `Invalidated` until disposed.
    pub(crate) fn invalidate(&mut self, slot: u32, reason: &'static str) {
        if let Some(record) = self.entries[slot as usize].record.as_mut() {
            if record.live {
                record.live = false;
                self.live -= 1;
                debug!(slot, reason, "view invalidated");
            }
        }
    }

    /// Releases a view. Returns `false` if the handle was already stale.
    pub(crate) fn dispose(&mut self, id: ViewId) -> bool {
        let Some(entry) = self.entries.get_mut(id.slot as usize) else {
            return false;
        };
        if entry.generation != id.generation {
            return false;
        }
        let Some(record) = entry.record.take() else {
            return false;
        };
        if record.live {
            self.live -= 1;
        }
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.slot);
        trace!(slot = id.slot, "view disposed");
        return true;
    }

    /// Disposes every registered view.
    pub(crate) fn dispose_all(&mut self) -> usize {
        let mut disposed = 0;
        for (slot, entry) in self.entries.iter_mut().enumerate() {
            if entry.record.take().is_some() {
                entry.generation = entry.generation.wrapping_add(1);
                self.free.push(slot as u32);
                disposed += 1;
            }
        }
        self.live = 0;
        if disposed > 0 {
            debug!(disposed, "all views disposed");
        }
        return disposed;
    }

    /// Live records other than the acting scope, for fix-ups.
    pub(crate) fn others_mut(&mut self, acting: Scope) -> impl Iterator<Item = (u32, &mut B)> {
        return self
            .entries
            .iter_mut()
            .enumerate()
            .filter_map(move |(slot, entry)| {
                let slot = slot as u32;
                match entry.record.as_mut() {
                    Some(record) if record.live && !acting.is_view(slot) => {
                        return Some((slot, &mut record.bounds));
                    }
                    _ => return None,
                }
            });
    }

    /// Live records other than the acting scope.
    pub(crate) fn others(&self, acting: Scope) -> impl Iterator<Item = (u32, &B)> {
        return self.entries.iter().enumerate().filter_map(move |(slot, entry)| {
            let slot = slot as u32;
            match entry.record.as_ref() {
                Some(record) if record.live && !acting.is_view(slot) => {
                    return Some((slot, &record.bounds));
                }
                _ => return None,
            }
        });
    }
}

/// How another view's range relates to the range being operated on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MutualPosition {
    /// The other view covers the whole operated range.
    Contains,
    /// The other view lies inside the operated range.
    ContainedIn,
    /// Partial overlap.
    Overlapping,
    /// Disjoint, possibly adjacent.
    NonOverlapping,
}

/// A range in any totally ordered coordinate: `start` is the position of the
/// first item (or of the end, when empty), `end` is one past the last item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Extent<K> {
    pub(crate) start: K,
    pub(crate) end: K,
    pub(crate) count: usize,
}

/// Classifies `other` relative to `this`.
pub(crate) fn classify<K: Ord>(this: &Extent<K>, other: &Extent<K>) -> MutualPosition {
    if other.start >= this.end || other.end <= this.start {
        return MutualPosition::NonOverlapping;
    }
    if this.count == 0 || (other.start <= this.start && this.end <= other.end) {
        return MutualPosition::Contains;
    }
    if other.count == 0 || (this.start <= other.start && other.end <= this.end) {
        return MutualPosition::ContainedIn;
    }
    return MutualPosition::Overlapping;
}

/// Which end of a view an endpoint belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Side {
    Start,
    End,
}

/// View endpoints sorted by position, consumed in lock-step with a
/// compaction cursor.
pub(crate) struct EndpointSweep<K> {
    ends: Vec<(K, Side, u32)>,
    next: usize,
}

impl<K: Ord + Copy> EndpointSweep<K> {
    pub(crate) fn new(mut ends: Vec<(K, Side, u32)>) -> EndpointSweep<K> {
        ends.sort_unstable_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        return EndpointSweep { ends, next: 0 };
    }

    /// Next endpoint positioned at or before `key`.
    #[inline]
    pub(crate) fn next_through(&mut self, key: K) -> Option<(K, Side, u32)> {
        let endpoint = *self.ends.get(self.next)?;
        if endpoint.0 > key {
            return None;
        }
        self.next += 1;
        return Some(endpoint);
    }

    /// Next endpoint regardless of position.
    #[inline]
    pub(crate) fn next_any(&mut self) -> Option<(K, Side, u32)> {
        let endpoint = *self.ends.get(self.next)?;
        self.next += 1;
        return Some(endpoint);
    }
}
