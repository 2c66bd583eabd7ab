//! Contiguous list engine.
//!
//! Items live in a `VecDeque`, so positional edits shift whichever side is
//! shorter. A view is an absolute `(offset, count)` pair in the root's index
//! space; every structural edit adjusts the views it does not act through:
//!
//! - insert of `k` at `i`: views strictly around `i` grow, views at or after
//!   `i` shift (an empty view at `i` stays put);
//! - removal: views shrink by the removed part they held and shift left by
//!   the removed part before them;
//! - reverse/sort/shuffle: views inside the range are mirrored (reverse) or
//!   invalidated (sort, shuffle); views partially overlapping it are
//!   invalidated.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::hash::Hash;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::trace;

use crate::config::{Config, Indexing, TRIM_RATIO};
use crate::equality::{Equality, Natural};
use crate::error::{check_index, check_position, check_range, Error, Result};
use crate::event::{Event, Events, Listener};
use crate::hash_index::HashIndex;
use crate::sequence::{apply_permutation, Backing, Cursor, Root, Sequence, Window};
use crate::view::{classify, EndpointSweep, Extent, MutualPosition, Registry, Scope, Side, ViewId, ViewState};

/// Absolute range of a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Span {
    offset: usize,
    count: usize,
}

impl Span {
    #[inline]
    fn end(&self) -> usize {
        return self.offset + self.count;
    }

    fn extent(&self) -> Extent<usize> {
        return Extent { start: self.offset, end: self.end(), count: self.count };
    }
}

/// Adjusts a view endpoint crossed by a compaction pass.
fn shift(span: &mut Span, side: Side, removed: usize) {
    match side {
        Side::Start => {
            span.offset -= removed;
            span.count += removed;
        }
        Side::End => span.count -= removed,
    }
}

/// An array-backed list with live views.
///
/// ```
/// use viewlist::{ArrayList, Sequence};
///
/// let mut list: ArrayList<char> = "abcde".chars().collect();
/// let v = list.view(1, 2).unwrap();
/// list.insert(1, 'x').unwrap();
/// assert_eq!(list.view_offset(v), Ok(2));
/// assert_eq!(list.window(v).unwrap().to_vec(), vec!['b', 'c']);
/// ```
#[derive(Debug)]
pub struct ArrayList<T, E = Natural> {
    items: VecDeque<T>,
    eq: E,
    index: Option<HashIndex<usize>>,
    views: Registry<Span>,
    events: Events<T>,
    version: u64,
    config: Config,
}

impl<T> ArrayList<T, Natural> {
    pub fn new() -> ArrayList<T, Natural> {
        return ArrayList::build(Natural, Config::default(), None);
    }

    /// An empty list with set semantics and an item index.
    pub fn hashed() -> ArrayList<T, Natural>
    where
        T: Eq + Hash,
    {
        return ArrayList::build(Natural, Config::default(), Some(HashIndex::new()));
    }
}

impl<T> Default for ArrayList<T, Natural> {
    fn default() -> Self {
        return ArrayList::new();
    }
}

/// Collecting grows the list the same way inserts do, but cannot report an
/// error.
///
/// # Panics
///
/// Panics if the iterator yields more than the default maximum capacity.
impl<T> FromIterator<T> for ArrayList<T, Natural> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = ArrayList::new();
        for item in iter {
            assert!(list.reserve(1).is_ok(), "collected past the maximum capacity");
            list.items.push_back(item);
        }
        return list;
    }
}

impl<T, E> ArrayList<T, E> {
    fn build(eq: E, config: Config, index: Option<HashIndex<usize>>) -> ArrayList<T, E> {
        return ArrayList {
            items: VecDeque::new(),
            eq,
            index,
            views: Registry::new(),
            events: Events::new(),
            version: 0,
            config,
        };
    }

    /// Incremented once per call that changed the item sequence.
    pub fn version(&self) -> u64 {
        return self.version;
    }

    pub fn is_hashed(&self) -> bool {
        return self.index.is_some();
    }

    pub fn config(&self) -> &Config {
        return &self.config;
    }

    pub fn capacity(&self) -> usize {
        return self.items.capacity();
    }

    /// Shrinks the store if it is filled below the trim ratio. Returns
    /// whether it shrank.
    pub fn trim_excess(&mut self) -> bool {
        let capacity = self.items.capacity();
        if (self.items.len() as f64) >= capacity as f64 * TRIM_RATIO {
            return false;
        }
        self.items.shrink_to_fit();
        trace!(from = capacity, to = self.items.capacity(), "array trimmed");
        return true;
    }

    /// Installs the change listener, replacing any previous one.
    pub fn subscribe<L: Listener<T> + 'static>(&mut self, listener: L) {
        self.events.subscribe(Box::new(listener));
    }

    pub fn unsubscribe(&mut self) -> bool {
        return self.events.unsubscribe();
    }

    pub fn view_state(&self, id: ViewId) -> ViewState {
        return self.views.state(id);
    }

    pub fn is_valid(&self, id: ViewId) -> bool {
        return self.views.state(id) == ViewState::Live;
    }

    /// Position of a view's first item in the list.
    pub fn view_offset(&self, id: ViewId) -> Result<usize> {
        let slot = self.views.resolve(id)?;
        return Ok(self.views.bounds(slot).offset);
    }

    pub fn view_len(&self, id: ViewId) -> Result<usize> {
        let slot = self.views.resolve(id)?;
        return Ok(self.views.bounds(slot).count);
    }

    /// Number of live views.
    pub fn live_views(&self) -> usize {
        return self.views.live();
    }

    /// Releases a view. Returns `false` if it was already disposed.
    pub fn dispose_view(&mut self, id: ViewId) -> bool {
        return self.views.dispose(id);
    }

    /// Disposes every view of the list. Returns how many were released.
    pub fn dispose_views(&mut self) -> usize {
        return self.views.dispose_all();
    }

    /// Consumes the list, disposing all of its views.
    pub fn dispose(mut self) {
        self.views.dispose_all();
    }

    /// Starts a detached traversal of the list or of a view.
    pub fn cursor(&self, view: Option<ViewId>) -> Result<Cursor> {
        let span = match view {
            None => self.span(Scope::Root),
            Some(id) => *self.views.bounds(self.views.resolve(id)?),
        };
        return Ok(Cursor { version: self.version, next: span.offset, remaining: span.count });
    }

    pub fn advance(&self, cursor: &mut Cursor) -> Result<Option<&T>> {
        cursor.check(self.version)?;
        if cursor.remaining == 0 {
            return Ok(None);
        }
        let item = &self.items[cursor.next];
        cursor.next += 1;
        cursor.remaining -= 1;
        return Ok(Some(item));
    }

    fn span(&self, scope: Scope) -> Span {
        return match scope {
            Scope::Root => Span { offset: 0, count: self.items.len() },
            Scope::View(slot) => *self.views.bounds(slot),
        };
    }

    /// Makes room for `additional` items, doubling from the minimum block.
    fn reserve(&mut self, additional: usize) -> Result<()> {
        let len = self.items.len();
        let max = self.config.max_capacity;
        let needed = match len.checked_add(additional) {
            Some(needed) if needed <= max => needed,
            _ => {
                return Err(Error::CapacityExceeded { requested: len.saturating_add(additional), max });
            }
        };
        let capacity = self.items.capacity();
        if needed <= capacity {
            return Ok(());
        }
        let target = (capacity * 2).max(self.config.min_block).max(needed).min(max);
        self.items.reserve_exact(target - len);
        trace!(from = capacity, to = target, "array grown");
        return Ok(());
    }

    fn fix_insert(&mut self, acting: Scope, at: usize, k: usize) {
        if let Scope::View(slot) = acting {
            self.views.bounds_mut(slot).count += k;
        }
        for (_, span) in self.views.others_mut(acting) {
            if span.offset < at && at < span.end() {
                span.count += k;
            } else if span.offset > at || (span.offset == at && span.count > 0) {
                span.offset += k;
            }
        }
    }

    fn fix_remove(&mut self, acting: Scope, start: usize, k: usize) {
        let end = start + k;
        if let Scope::View(slot) = acting {
            self.views.bounds_mut(slot).count -= k;
        }
        for (_, span) in self.views.others_mut(acting) {
            let before = end.min(span.offset) - start.min(span.offset);
            let inside = end.min(span.end()).saturating_sub(start.max(span.offset));
            span.offset -= before;
            span.count -= inside;
        }
    }

    /// Mirrors or invalidates the views affected by reordering `range`.
    fn fix_reorder(&mut self, acting: Scope, range: Span, reversal: bool) {
        let this = range.extent();
        let mut doomed = Vec::new();
        for (slot, span) in self.views.others_mut(acting) {
            match classify(&this, &span.extent()) {
                MutualPosition::Contains | MutualPosition::NonOverlapping => {}
                MutualPosition::ContainedIn if reversal => {
                    span.offset = 2 * range.offset + range.count - span.count - span.offset;
                }
                MutualPosition::ContainedIn => doomed.push((slot, "inside a reordered range")),
                MutualPosition::Overlapping => doomed.push((slot, "overlaps a reordered range")),
            }
        }
        for (slot, reason) in doomed {
            self.views.invalidate(slot, reason);
        }
    }
}

impl<T, E: Equality<T>> ArrayList<T, E> {
    /// A list with a custom comparer and configuration.
    ///
    /// Hashed indexing needs a comparer that can hash.
    pub fn with_equality(eq: E, config: Config, indexing: Indexing) -> Result<ArrayList<T, E>> {
        config.validate()?;
        let index = match indexing {
            Indexing::Plain => None,
            Indexing::Hashed if E::HASHES => Some(HashIndex::new()),
            Indexing::Hashed => return Err(Error::NotSupported("hashed indexing needs a hashing comparer")),
        };
        return Ok(ArrayList::build(eq, config, index));
    }

    /// Exclusive access to a live view.
    pub fn window(&mut self, id: ViewId) -> Result<Window<'_, T, Self>> {
        let slot = self.views.resolve(id)?;
        return Ok(Window::new(self, id, slot));
    }

    /// Asserts that views, store and item index agree.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first broken invariant.
    pub fn check_invariants(&self) {
        let len = self.items.len();
        for (slot, span) in self.views.others(Scope::Root) {
            assert!(span.end() <= len, "view {} ends at {} past length {}", slot, span.end(), len);
        }
        let Some(index) = &self.index else {
            return;
        };
        assert_eq!(index.len(), len, "index size");
        for (hash, loc) in index.entries() {
            assert!(loc < len, "index entry {} out of range", loc);
            assert_eq!(self.eq.hash(&self.items[loc]), hash, "index entry {} under the wrong hash", loc);
        }
        for (i, item) in self.items.iter().enumerate() {
            let found = index.find(self.eq.hash(item), |loc| self.eq.equals(&self.items[loc], item));
            assert_eq!(found, Some(i), "index entry for item at {}", i);
        }
    }

    /// Location of an item equal to `item`, from the index.
    fn lookup(&self, item: &T) -> Option<usize> {
        let index = self.index.as_ref()?;
        return index.find(self.eq.hash(item), |loc| self.eq.equals(&self.items[loc], item));
    }

    /// Re-records items in `start..end` that used to sit in `start..stale_end`.
    fn reindex(&mut self, start: usize, end: usize, stale_end: usize) {
        let Some(index) = self.index.as_mut() else {
            return;
        };
        let fresh: Vec<(u64, usize)> = (start..end).map(|i| (self.eq.hash(&self.items[i]), i)).collect();
        index.reindex(&fresh, |loc| start <= loc && loc < stale_end);
    }

    /// Drops candidates already present or repeated earlier in the batch.
    fn admit(&self, items: Vec<T>) -> Vec<T> {
        let Some(index) = &self.index else {
            return items;
        };
        let mut batch: HashIndex<usize> = HashIndex::new();
        let mut accepted: Vec<T> = Vec::with_capacity(items.len());
        for item in items {
            let hash = self.eq.hash(&item);
            if index.find(hash, |loc| self.eq.equals(&self.items[loc], &item)).is_some() {
                continue;
            }
            if batch.find(hash, |at| self.eq.equals(&accepted[at], &item)).is_some() {
                continue;
            }
            batch.insert(hash, accepted.len());
            accepted.push(item);
        }
        return accepted;
    }

    fn take_at(&mut self, acting: Scope, at: usize) -> T {
        let old_len = self.items.len();
        let item = self.items.remove(at).expect("index checked by caller");
        if let Some(index) = self.index.as_mut() {
            index.remove(self.eq.hash(&item), at);
        }
        self.reindex(at, self.items.len(), old_len);
        self.fix_remove(acting, at, 1);
        self.version += 1;
        return item;
    }

    fn remove_run(&mut self, acting: Scope, start: usize, count: usize) -> Vec<T> {
        let old_len = self.items.len();
        if let Some(index) = self.index.as_mut() {
            if count == old_len {
                index.clear();
            } else {
                for at in start..start + count {
                    index.remove(self.eq.hash(&self.items[at]), at);
                }
            }
        }
        let removed: Vec<T> = self.items.drain(start..start + count).collect();
        self.reindex(start, self.items.len(), old_len);
        self.fix_remove(acting, start, count);
        self.version += 1;
        return removed;
    }

    /// One compaction pass over the acting range, sweeping the endpoints of
    /// the other views as it goes.
    fn compact<F: FnMut(&E, &T) -> bool>(&mut self, acting: Scope, mut pred: F) -> usize {
        let range = self.span(acting);
        if range.count == 0 {
            return 0;
        }
        let mut ends = Vec::with_capacity(2 * self.views.live());
        for (slot, span) in self.views.others(acting) {
            ends.push((span.offset, Side::Start, slot));
            ends.push((span.end(), Side::End, slot));
        }
        let mut sweep = EndpointSweep::new(ends);

        let mut removed = 0;
        for at in range.offset..range.end() {
            while let Some((_, side, slot)) = sweep.next_through(at) {
                shift(self.views.bounds_mut(slot), side, removed);
            }
            if pred(&self.eq, &self.items[at]) {
                if let Some(index) = self.index.as_mut() {
                    index.remove(self.eq.hash(&self.items[at]), at);
                }
                removed += 1;
            } else if removed > 0 {
                self.items.swap(at - removed, at);
            }
        }
        if removed == 0 {
            return 0;
        }
        while let Some((_, side, slot)) = sweep.next_any() {
            shift(self.views.bounds_mut(slot), side, removed);
        }
        if let Scope::View(slot) = acting {
            self.views.bounds_mut(slot).count -= removed;
        }

        let old_len = self.items.len();
        let gone: Vec<T> = self.items.drain(range.end() - removed..range.end()).collect();
        self.reindex(range.offset, self.items.len(), old_len);
        self.version += 1;
        for item in &gone {
            self.events.emit(Event::Removed { item, count: 1 });
        }
        self.events.changed();
        return removed;
    }

    fn reordered(&mut self, range: Span) {
        self.reindex(range.offset, range.end(), range.end());
        self.version += 1;
        self.events.emit(Event::Reordered { count: range.count });
        self.events.changed();
    }
}

impl<T, E: Equality<T>> Backing<T> for ArrayList<T, E> {
    fn scope_len(&self, scope: Scope) -> usize {
        return self.span(scope).count;
    }

    fn scope_offset(&self, scope: Scope) -> usize {
        return self.span(scope).offset;
    }

    fn scope_get(&self, scope: Scope, index: usize) -> Result<&T> {
        let span = self.span(scope);
        check_index(index, span.count)?;
        return Ok(&self.items[span.offset + index]);
    }

    fn scope_iter<'a>(&'a self, scope: Scope) -> impl Iterator<Item = &'a T>
    where
        T: 'a,
    {
        let span = self.span(scope);
        return self.items.range(span.offset..span.end());
    }

    fn scope_find(&self, scope: Scope, item: &T, from_back: bool) -> Option<usize> {
        let span = self.span(scope);
        if self.index.is_some() {
            let at = self.lookup(item)?;
            if span.offset <= at && at < span.end() {
                return Some(at - span.offset);
            }
            return None;
        }
        let mut range = self.items.range(span.offset..span.end());
        if from_back {
            return range.rposition(|x| self.eq.equals(x, item));
        }
        return range.position(|x| self.eq.equals(x, item));
    }

    fn scope_count_of(&self, scope: Scope, item: &T) -> usize {
        if self.index.is_some() {
            return self.scope_find(scope, item, false).map_or(0, |_| 1);
        }
        return self.scope_iter(scope).filter(|x| self.eq.equals(x, item)).count();
    }

    fn scope_set(&mut self, scope: Scope, index: usize, item: T) -> Result<T> {
        let span = self.span(scope);
        check_index(index, span.count)?;
        let at = span.offset + index;
        if let Some(found) = self.lookup(&item) {
            if found != at {
                return Err(Error::Duplicate);
            }
        }
        let old = std::mem::replace(&mut self.items[at], item);
        if let Some(idx) = self.index.as_mut() {
            idx.remove(self.eq.hash(&old), at);
            idx.insert(self.eq.hash(&self.items[at]), at);
        }
        self.version += 1;
        self.events.emit(Event::Replaced { index, old: &old, new: &self.items[at] });
        self.events.changed();
        return Ok(old);
    }

    fn scope_insert(&mut self, scope: Scope, index: usize, item: T) -> Result<bool> {
        let span = self.span(scope);
        check_position(index, span.count)?;
        if self.lookup(&item).is_some() {
            return Ok(false);
        }
        self.reserve(1)?;
        let at = span.offset + index;
        let old_len = self.items.len();
        self.items.insert(at, item);
        self.reindex(at, self.items.len(), old_len);
        self.fix_insert(scope, at, 1);
        self.version += 1;
        self.events.emit(Event::Inserted { index, item: &self.items[at] });
        self.events.changed();
        return Ok(true);
    }

    fn scope_insert_all(&mut self, scope: Scope, index: usize, items: Vec<T>) -> Result<usize> {
        let span = self.span(scope);
        check_position(index, span.count)?;
        let items = self.admit(items);
        let k = items.len();
        if k == 0 {
            return Ok(0);
        }
        self.reserve(k)?;
        let at = span.offset + index;
        let old_len = self.items.len();
        let tail = self.items.split_off(at);
        self.items.extend(items);
        self.items.extend(tail);
        self.reindex(at, self.items.len(), old_len);
        self.fix_insert(scope, at, k);
        self.version += 1;
        for item in self.items.range(at..at + k) {
            self.events.emit(Event::Added { item, count: 1 });
        }
        self.events.changed();
        return Ok(k);
    }

    fn scope_remove_at(&mut self, scope: Scope, index: usize) -> Result<T> {
        let span = self.span(scope);
        check_index(index, span.count)?;
        let item = self.take_at(scope, span.offset + index);
        self.events.emit(Event::RemovedAt { index, item: &item });
        self.events.changed();
        return Ok(item);
    }

    fn scope_remove(&mut self, scope: Scope, item: &T) -> Option<T> {
        let index = self.scope_find(scope, item, false)?;
        let at = self.span(scope).offset + index;
        let removed = self.take_at(scope, at);
        self.events.emit(Event::Removed { item: &removed, count: 1 });
        self.events.changed();
        return Some(removed);
    }

    fn scope_remove_all_copies(&mut self, scope: Scope, item: &T) -> usize {
        if self.index.is_some() {
            return self.scope_remove(scope, item).map_or(0, |_| 1);
        }
        return self.compact(scope, |eq, x| eq.equals(x, item));
    }

    fn scope_remove_interval(&mut self, scope: Scope, start: usize, count: usize) -> Result<()> {
        let span = self.span(scope);
        check_range(start, count, span.count)?;
        if count == 0 {
            return Ok(());
        }
        self.remove_run(scope, span.offset + start, count);
        self.events.emit(Event::Cleared { full: false, count, offset: Some(start) });
        self.events.changed();
        return Ok(());
    }

    fn scope_remove_where<F: FnMut(&T) -> bool>(&mut self, scope: Scope, mut pred: F) -> usize {
        return self.compact(scope, |_, x| pred(x));
    }

    fn scope_clear(&mut self, scope: Scope) {
        let span = self.span(scope);
        if span.count == 0 {
            return;
        }
        self.remove_run(scope, span.offset, span.count);
        self.events.emit(Event::Cleared { full: scope == Scope::Root, count: span.count, offset: None });
        self.events.changed();
    }

    fn scope_reverse(&mut self, scope: Scope) {
        let range = self.span(scope);
        let (o, c) = (range.offset, range.count);
        if c < 2 {
            return;
        }
        self.fix_reorder(scope, range, true);
        for i in 0..c / 2 {
            self.items.swap(o + i, o + c - 1 - i);
        }
        self.reordered(range);
    }

    fn scope_sort_by<F: FnMut(&T, &T) -> Ordering>(&mut self, scope: Scope, mut cmp: F) {
        let range = self.span(scope);
        if range.count < 2 {
            return;
        }
        let (o, end) = (range.offset, range.end());
        let sorted = self
            .items
            .range(o..end - 1)
            .zip(self.items.range(o + 1..end))
            .all(|(a, b)| cmp(a, b) != Ordering::Greater);
        if sorted {
            return;
        }
        self.fix_reorder(scope, range, false);
        self.items.make_contiguous()[o..end].sort_by(cmp);
        self.reordered(range);
    }

    fn scope_shuffle<R: Rng + ?Sized>(&mut self, scope: Scope, rng: &mut R) {
        let range = self.span(scope);
        let (o, c) = (range.offset, range.count);
        if c < 2 {
            return;
        }
        let mut perm: Vec<usize> = (0..c).collect();
        perm.shuffle(rng);
        if perm.iter().enumerate().all(|(i, &from)| i == from) {
            return;
        }
        self.fix_reorder(scope, range, false);
        apply_permutation(&mut self.items.make_contiguous()[o..o + c], &perm);
        self.reordered(range);
    }

    fn scope_view(&mut self, scope: Scope, start: usize, count: usize) -> Result<ViewId> {
        let span = self.span(scope);
        check_range(start, count, span.count)?;
        return Ok(self.views.register(Span { offset: span.offset + start, count }));
    }

    fn view_slide(&mut self, slot: u32, delta: isize, size: usize) -> Result<()> {
        let span = *self.views.bounds(slot);
        let len = self.items.len();
        match span.offset.checked_add_signed(delta) {
            Some(offset) if offset.checked_add(size).is_some_and(|end| end <= len) => {
                *self.views.bounds_mut(slot) = Span { offset, count: size };
                return Ok(());
            }
            _ => {
                return Err(Error::RangeOutOfBounds {
                    start: span.offset.saturating_add_signed(delta),
                    count: size,
                    len,
                });
            }
        }
    }

    fn view_span(&mut self, slot: u32, other: ViewId) -> Result<Option<ViewId>> {
        let other = *self.views.bounds(self.views.resolve(other)?);
        let this = *self.views.bounds(slot);
        if other.end() < this.offset {
            return Ok(None);
        }
        let span = Span { offset: this.offset, count: other.end() - this.offset };
        return Ok(Some(self.views.register(span)));
    }

    fn view_release(&mut self, id: ViewId) -> bool {
        return self.views.dispose(id);
    }
}

impl<T, E: Equality<T>> Sequence<T> for ArrayList<T, E> {
    type Backing = Self;

    fn backing(&self) -> (&Self, Scope) {
        return (self, Scope::Root);
    }

    fn backing_mut(&mut self) -> (&mut Self, Scope) {
        return (self, Scope::Root);
    }
}

impl<T, E: Equality<T>> Root<T> for ArrayList<T, E> {
    fn window(&mut self, id: ViewId) -> Result<Window<'_, T, Self>> {
        return ArrayList::window(self, id);
    }

    fn version(&self) -> u64 {
        return self.version;
    }

    fn view_state(&self, id: ViewId) -> ViewState {
        return self.views.state(id);
    }

    fn view_offset(&self, id: ViewId) -> Result<usize> {
        return ArrayList::view_offset(self, id);
    }

    fn view_len(&self, id: ViewId) -> Result<usize> {
        return ArrayList::view_len(self, id);
    }

    fn dispose_view(&mut self, id: ViewId) -> bool {
        return self.views.dispose(id);
    }

    fn cursor(&self, view: Option<ViewId>) -> Result<Cursor> {
        return ArrayList::cursor(self, view);
    }

    fn advance(&self, cursor: &mut Cursor) -> Result<Option<&T>> {
        return ArrayList::advance(self, cursor);
    }

    fn subscribe<L: Listener<T> + 'static>(&mut self, listener: L) {
        self.events.subscribe(Box::new(listener));
    }

    fn check_invariants(&self) {
        ArrayList::check_invariants(self);
    }
}
