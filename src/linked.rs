//! Linked list engine.
//!
//! Nodes live in the [`Order`] arena and items in a parallel `Vec`. A view
//! is a pair of boundary nodes (the node before its first item and the node
//! after its last) plus a count. Boundaries never move when unrelated nodes
//! come and go, so most edits only touch the views whose boundary is the
//! edited node. Relative order of two arbitrary nodes comes from the tag
//! index, not from walking the chain.
//!
//! Reverse, sort and shuffle move items between fixed nodes: tags and
//! boundaries stay put.

use std::cmp::Ordering;
use std::hash::Hash;

use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::config::{Config, Indexing, TRIM_RATIO};
use crate::equality::{Equality, Natural};
use crate::error::{check_index, check_position, check_range, Error, Result};
use crate::event::{Event, Events, Listener};
use crate::hash_index::HashIndex;
use crate::order::{Order, HEAD, TAIL};
use crate::sequence::{apply_permutation, Backing, Cursor, Root, Sequence, Window};
use crate::view::{classify, EndpointSweep, Extent, MutualPosition, Registry, Scope, Side, ViewId, ViewState};

/// Boundary nodes of a view. Items are strictly between `start` and `end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Bounds {
    start: u32,
    end: u32,
    count: usize,
}

/// A doubly linked list with live views and O(1) node order queries.
///
/// ```
/// use viewlist::{LinkedList, Sequence};
///
/// let mut list: LinkedList<u32> = (0..6).collect();
/// let v = list.view(2, 3).unwrap();
/// list.remove_interval(1, 2).unwrap();
/// assert_eq!(list.to_vec(), vec![0, 3, 4, 5]);
/// assert_eq!(list.window(v).unwrap().to_vec(), vec![3, 4]);
/// ```
#[derive(Debug)]
pub struct LinkedList<T, E = Natural> {
    order: Order,
    /// Parallel to the arena; `None` for sentinels and vacant slots.
    items: Vec<Option<T>>,
    len: usize,
    eq: E,
    index: Option<HashIndex<u32>>,
    views: Registry<Bounds>,
    events: Events<T>,
    version: u64,
    config: Config,
}

impl<T> LinkedList<T, Natural> {
    pub fn new() -> LinkedList<T, Natural> {
        return LinkedList::build(Natural, Config::default(), None);
    }

    /// An empty list with set semantics and an item index.
    pub fn hashed() -> LinkedList<T, Natural>
    where
        T: Eq + Hash,
    {
        return LinkedList::build(Natural, Config::default(), Some(HashIndex::new()));
    }
}

impl<T> Default for LinkedList<T, Natural> {
    fn default() -> Self {
        return LinkedList::new();
    }
}

/// Collecting is bounded like inserts, but cannot report an error.
///
/// # Panics
///
/// Panics if the iterator yields more than the default maximum capacity.
impl<T> FromIterator<T> for LinkedList<T, Natural> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = LinkedList::new();
        let mut last = HEAD;
        for item in iter {
            assert!(list.reserve(1).is_ok(), "collected past the maximum capacity");
            last = list.order.insert_after(last);
            list.store(last, item);
            list.len += 1;
        }
        return list;
    }
}

impl<T, E> LinkedList<T, E> {
    fn build(eq: E, config: Config, index: Option<HashIndex<u32>>) -> LinkedList<T, E> {
        return LinkedList {
            order: Order::new(&config),
            items: vec![None, None],
            len: 0,
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

    /// Node slots allocated, sentinels excluded.
    pub fn capacity(&self) -> usize {
        return self.order.slot_capacity().saturating_sub(2);
    }

    /// Number of tag groups in the order index.
    pub fn tag_groups(&self) -> usize {
        return self.order.groups();
    }

    /// Releases spare arena memory if it is filled below the trim ratio.
    pub fn trim_excess(&mut self) -> bool {
        let capacity = self.order.slot_capacity();
        if (self.order.slots() as f64) >= capacity as f64 * TRIM_RATIO {
            return false;
        }
        self.order.shrink_to_fit();
        self.items.shrink_to_fit();
        trace!(from = capacity, to = self.order.slot_capacity(), "node arena trimmed");
        return true;
    }

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

    /// Position of a view's first item in the list. Walks the list.
    pub fn view_offset(&self, id: ViewId) -> Result<usize> {
        let slot = self.views.resolve(id)?;
        return Ok(self.offset_of(*self.views.bounds(slot)));
    }

    pub fn view_len(&self, id: ViewId) -> Result<usize> {
        let slot = self.views.resolve(id)?;
        return Ok(self.views.bounds(slot).count);
    }

    pub fn live_views(&self) -> usize {
        return self.views.live();
    }

    pub fn dispose_view(&mut self, id: ViewId) -> bool {
        return self.views.dispose(id);
    }

    pub fn dispose_views(&mut self) -> usize {
        return self.views.dispose_all();
    }

    /// Consumes the list, disposing all of its views.
    pub fn dispose(mut self) {
        self.views.dispose_all();
    }

    pub fn cursor(&self, view: Option<ViewId>) -> Result<Cursor> {
        let bounds = match view {
            None => self.bounds(Scope::Root),
            Some(id) => *self.views.bounds(self.views.resolve(id)?),
        };
        return Ok(Cursor {
            version: self.version,
            next: self.order.next(bounds.start) as usize,
            remaining: bounds.count,
        });
    }

    pub fn advance(&self, cursor: &mut Cursor) -> Result<Option<&T>> {
        cursor.check(self.version)?;
        if cursor.remaining == 0 {
            return Ok(None);
        }
        let node = cursor.next as u32;
        cursor.next = self.order.next(node) as usize;
        cursor.remaining -= 1;
        return Ok(Some(self.item(node)));
    }

    fn bounds(&self, scope: Scope) -> Bounds {
        return match scope {
            Scope::Root => Bounds { start: HEAD, end: TAIL, count: self.len },
            Scope::View(slot) => *self.views.bounds(slot),
        };
    }

    #[inline]
    fn item(&self, node: u32) -> &T {
        return self.items[node as usize].as_ref().expect("live node holds an item");
    }

    fn store(&mut self, node: u32, item: T) {
        let at = node as usize;
        if at == self.items.len() {
            if self.items.len() == self.items.capacity() {
                trace!(slots = at, "node arena grown");
            }
            self.items.push(Some(item));
        } else {
            self.items[at] = Some(item);
        }
    }

    /// Node at position `index` of a range; `index == count` gives `end`.
    fn node_at(&self, bounds: Bounds, index: usize) -> u32 {
        if index <= bounds.count / 2 {
            let mut node = self.order.next(bounds.start);
            for _ in 0..index {
                node = self.order.next(node);
            }
            return node;
        }
        let mut node = bounds.end;
        for _ in index..bounds.count {
            node = self.order.prev(node);
        }
        return node;
    }

    /// Position of `node` within a range it belongs to.
    fn position_of(&self, bounds: Bounds, node: u32) -> usize {
        let mut at = self.order.next(bounds.start);
        let mut position = 0;
        while at != node {
            at = self.order.next(at);
            position += 1;
        }
        return position;
    }

    fn offset_of(&self, bounds: Bounds) -> usize {
        if bounds.start == HEAD {
            return 0;
        }
        return self.position_of(self.bounds(Scope::Root), bounds.start) + 1;
    }

    fn nodes_of(&self, bounds: Bounds) -> Vec<u32> {
        let mut nodes = Vec::with_capacity(bounds.count);
        let mut node = self.order.next(bounds.start);
        while node != bounds.end {
            nodes.push(node);
            node = self.order.next(node);
        }
        return nodes;
    }

    fn extent(&self, bounds: Bounds) -> Extent<(i32, i32)> {
        return Extent {
            start: self.order.key(self.order.next(bounds.start)),
            end: self.order.key(bounds.end),
            count: bounds.count,
        };
    }

    fn reserve(&self, additional: usize) -> Result<()> {
        let max = self.config.max_capacity;
        match self.len.checked_add(additional) {
            Some(needed) if needed <= max => return Ok(()),
            _ => {
                return Err(Error::CapacityExceeded { requested: self.len.saturating_add(additional), max });
            }
        }
    }

    /// Adjusts other views for `k` new nodes `first..=last` linked between
    /// `prev` and `next`.
    fn fix_insert(&mut self, acting: Scope, prev: u32, next: u32, first: u32, last: u32, k: usize) {
        if let Scope::View(slot) = acting {
            self.views.bounds_mut(slot).count += k;
        }
        let order = &self.order;
        for (_, bounds) in self.views.others_mut(acting) {
            if bounds.start == prev && bounds.count > 0 {
                bounds.start = last;
            } else if bounds.end == next {
                bounds.end = first;
            } else if order.precedes(bounds.start, prev) && order.precedes(next, bounds.end) {
                bounds.count += k;
            }
        }
    }

    /// Mirrors or invalidates the views affected by reordering `range`.
    fn fix_reorder(&mut self, acting: Scope, range: Bounds, nodes: &[u32], reversal: bool) {
        let this = self.extent(range);
        let mut positions: FxHashMap<u32, usize> = FxHashMap::default();
        if reversal {
            positions.extend(nodes.iter().enumerate().map(|(i, node)| (*node, i)));
        }
        let c = nodes.len();
        let order = &self.order;
        let mut doomed = Vec::new();
        for (slot, bounds) in self.views.others_mut(acting) {
            let other = Extent {
                start: order.key(order.next(bounds.start)),
                end: order.key(bounds.end),
                count: bounds.count,
            };
            match classify(&this, &other) {
                MutualPosition::Contains | MutualPosition::NonOverlapping => {}
                MutualPosition::ContainedIn if reversal => {
                    let i = positions[&order.next(bounds.start)];
                    let j = i + bounds.count;
                    bounds.start = if j == c { range.start } else { nodes[c - j - 1] };
                    bounds.end = if i == 0 { range.end } else { nodes[c - i] };
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

impl<T, E: Equality<T>> LinkedList<T, E> {
    /// A list with a custom comparer and configuration.
    ///
    /// Hashed indexing needs a comparer that can hash.
    pub fn with_equality(eq: E, config: Config, indexing: Indexing) -> Result<LinkedList<T, E>> {
        config.validate()?;
        let index = match indexing {
            Indexing::Plain => None,
            Indexing::Hashed if E::HASHES => Some(HashIndex::new()),
            Indexing::Hashed => return Err(Error::NotSupported("hashed indexing needs a hashing comparer")),
        };
        return Ok(LinkedList::build(eq, config, index));
    }

    pub fn window(&mut self, id: ViewId) -> Result<Window<'_, T, Self>> {
        let slot = self.views.resolve(id)?;
        return Ok(Window::new(self, id, slot));
    }

    /// Asserts that links, tags, views and item index agree.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first broken invariant.
    pub fn check_invariants(&self) {
        assert_eq!(self.order.check(), self.len, "linked length");
        let stored = self.items.iter().filter(|item| item.is_some()).count();
        assert_eq!(stored, self.len, "stored items");
        for (slot, bounds) in self.views.others(Scope::Root) {
            assert!(self.order.precedes(bounds.start, bounds.end), "view {} boundaries out of order", slot);
            let mut node = bounds.start;
            for _ in 0..bounds.count {
                node = self.order.next(node);
                assert!(node != bounds.end && node != TAIL, "view {} holds fewer items than counted", slot);
            }
            assert_eq!(self.order.next(node), bounds.end, "view {} holds more items than counted", slot);
        }
        let Some(index) = &self.index else {
            return;
        };
        assert_eq!(index.len(), self.len, "index size");
        for node in self.nodes_of(self.bounds(Scope::Root)) {
            let item = self.item(node);
            let found = index.find(self.eq.hash(item), |loc| self.eq.equals(self.item(loc), item));
            assert_eq!(found, Some(node), "index entry for node {}", node);
        }
    }

    fn lookup(&self, item: &T) -> Option<u32> {
        let index = self.index.as_ref()?;
        return index.find(self.eq.hash(item), |loc| self.eq.equals(self.item(loc), item));
    }

    fn admit(&self, items: Vec<T>) -> Vec<T> {
        let Some(index) = &self.index else {
            return items;
        };
        let mut batch: HashIndex<usize> = HashIndex::new();
        let mut accepted: Vec<T> = Vec::with_capacity(items.len());
        for item in items {
            let hash = self.eq.hash(&item);
            if index.find(hash, |loc| self.eq.equals(self.item(loc), &item)).is_some() {
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

    /// Links `items` after `prev`, returning the first and last new nodes.
    fn splice(&mut self, prev: u32, items: Vec<T>) -> (u32, u32) {
        let mut last = prev;
        for item in items {
            last = self.order.insert_after(last);
            if let Some(index) = self.index.as_mut() {
                index.insert(self.eq.hash(&item), last);
            }
            self.store(last, item);
            self.len += 1;
        }
        return (self.order.next(prev), last);
    }

    fn take_node(&mut self, acting: Scope, node: u32) -> T {
        let prev = self.order.prev(node);
        let next = self.order.next(node);
        if let Scope::View(slot) = acting {
            self.views.bounds_mut(slot).count -= 1;
        }
        let order = &self.order;
        for (_, bounds) in self.views.others_mut(acting) {
            if bounds.start == node {
                bounds.start = prev;
            } else if bounds.end == node {
                bounds.end = next;
            } else if order.precedes(bounds.start, node) && order.precedes(node, bounds.end) {
                bounds.count -= 1;
            }
        }
        let item = self.items[node as usize].take().expect("live node holds an item");
        if let Some(index) = self.index.as_mut() {
            index.remove(self.eq.hash(&item), node);
        }
        self.order.remove(node);
        self.len -= 1;
        self.version += 1;
        return item;
    }

    /// Removes the nodes strictly between `from` and `to` that `doomed`
    /// selects, in one walk.
    ///
    /// The endpoints of every other view are swept in key order alongside
    /// the walk. A boundary that is itself removed moves to the nearest
    /// surviving node on its side, or to `from`/`to` at the ends.
    fn sweep_remove<F: FnMut(&E, &T) -> bool>(&mut self, acting: Scope, from: u32, to: u32, mut doomed: F) -> Vec<T> {
        let mut ends = Vec::with_capacity(2 * self.views.live());
        for (slot, bounds) in self.views.others(acting) {
            ends.push((self.order.key(bounds.start), Side::Start, slot));
            ends.push((self.order.key(bounds.end), Side::End, slot));
        }
        let mut sweep = EndpointSweep::new(ends);
        while sweep.next_through(self.order.key(from)).is_some() {}

        let mut removed = 0;
        let mut last_kept = from;
        let mut pending: Vec<u32> = Vec::new();
        let mut dead: Vec<u32> = Vec::new();
        let mut node = self.order.next(from);
        while node != to {
            let item = self.items[node as usize].as_ref().expect("live node holds an item");
            let gone = doomed(&self.eq, item);
            if gone {
                removed += 1;
                dead.push(node);
            } else {
                for slot in pending.drain(..) {
                    self.views.bounds_mut(slot).end = node;
                }
                last_kept = node;
            }
            let key = self.order.key(node);
            while let Some((_, side, slot)) = sweep.next_through(key) {
                let bounds = self.views.bounds_mut(slot);
                match side {
                    Side::Start if gone => {
                        bounds.start = last_kept;
                        bounds.count += removed;
                    }
                    Side::Start => bounds.count += removed,
                    Side::End if gone => {
                        bounds.count -= removed - 1;
                        pending.push(slot);
                    }
                    Side::End => bounds.count -= removed,
                }
            }
            node = self.order.next(node);
        }
        if removed == 0 {
            return Vec::new();
        }
        while let Some((_, side, slot)) = sweep.next_any() {
            let bounds = self.views.bounds_mut(slot);
            match side {
                Side::Start => bounds.count += removed,
                Side::End => bounds.count -= removed,
            }
        }
        for slot in pending {
            self.views.bounds_mut(slot).end = to;
        }
        if let Scope::View(slot) = acting {
            self.views.bounds_mut(slot).count -= removed;
        }

        let mut out = Vec::with_capacity(removed);
        for node in dead {
            let item = self.items[node as usize].take().expect("live node holds an item");
            if let Some(index) = self.index.as_mut() {
                index.remove(self.eq.hash(&item), node);
            }
            self.order.remove(node);
            out.push(item);
        }
        self.len -= removed;
        self.version += 1;
        return out;
    }

    /// Empties the whole list. Every view collapses onto the sentinels.
    fn reset(&mut self) {
        for (_, bounds) in self.views.others_mut(Scope::Root) {
            *bounds = Bounds { start: HEAD, end: TAIL, count: 0 };
        }
        self.order.reset();
        self.items.truncate(2);
        if let Some(index) = self.index.as_mut() {
            index.clear();
        }
        self.len = 0;
        self.version += 1;
    }

    /// Takes the items of `nodes` out, reorders them, and puts them back.
    fn permute(&mut self, range: Bounds, nodes: &[u32], reorder: impl FnOnce(&mut Vec<T>)) {
        let mut values: Vec<T> = nodes
            .iter()
            .map(|node| self.items[*node as usize].take().expect("live node holds an item"))
            .collect();
        reorder(&mut values);
        for (node, value) in nodes.iter().zip(values) {
            self.items[*node as usize] = Some(value);
        }

        if let Some(index) = self.index.as_mut() {
            let fresh: Vec<(u64, u32)> = nodes
                .iter()
                .map(|node| {
                    let item = self.items[*node as usize].as_ref().expect("live node holds an item");
                    (self.eq.hash(item), *node)
                })
                .collect();
            let order = &self.order;
            index.reindex(&fresh, |loc| order.precedes(range.start, loc) && order.precedes(loc, range.end));
        }
        self.version += 1;
        self.events.emit(Event::Reordered { count: nodes.len() });
        self.events.changed();
    }

    fn emit_removed(&mut self, removed: &[T]) {
        for item in removed {
            self.events.emit(Event::Removed { item, count: 1 });
        }
        self.events.changed();
    }
}

impl<T, E: Equality<T>> Backing<T> for LinkedList<T, E> {
    fn scope_len(&self, scope: Scope) -> usize {
        return self.bounds(scope).count;
    }

    fn scope_offset(&self, scope: Scope) -> usize {
        return self.offset_of(self.bounds(scope));
    }

    fn scope_get(&self, scope: Scope, index: usize) -> Result<&T> {
        let bounds = self.bounds(scope);
        check_index(index, bounds.count)?;
        return Ok(self.item(self.node_at(bounds, index)));
    }

    fn scope_iter<'a>(&'a self, scope: Scope) -> impl Iterator<Item = &'a T>
    where
        T: 'a,
    {
        let bounds = self.bounds(scope);
        let mut node = bounds.start;
        return (0..bounds.count).map(move |_| {
            node = self.order.next(node);
            return self.item(node);
        });
    }

    fn scope_find(&self, scope: Scope, item: &T, from_back: bool) -> Option<usize> {
        let bounds = self.bounds(scope);
        if self.index.is_some() {
            let node = self.lookup(item)?;
            if self.order.precedes(bounds.start, node) && self.order.precedes(node, bounds.end) {
                return Some(self.position_of(bounds, node));
            }
            return None;
        }
        if !from_back {
            return self.scope_iter(scope).position(|x| self.eq.equals(x, item));
        }
        let mut node = bounds.end;
        for position in (0..bounds.count).rev() {
            node = self.order.prev(node);
            if self.eq.equals(self.item(node), item) {
                return Some(position);
            }
        }
        return None;
    }

    fn scope_count_of(&self, scope: Scope, item: &T) -> usize {
        if self.index.is_some() {
            return self.scope_find(scope, item, false).map_or(0, |_| 1);
        }
        return self.scope_iter(scope).filter(|x| self.eq.equals(x, item)).count();
    }

    fn scope_set(&mut self, scope: Scope, index: usize, item: T) -> Result<T> {
        let bounds = self.bounds(scope);
        check_index(index, bounds.count)?;
        let node = self.node_at(bounds, index);
        if let Some(found) = self.lookup(&item) {
            if found != node {
                return Err(Error::Duplicate);
            }
        }
        let old = self.items[node as usize].replace(item).expect("live node holds an item");
        if let Some(idx) = self.index.as_mut() {
            let new = self.items[node as usize].as_ref().expect("live node holds an item");
            idx.remove(self.eq.hash(&old), node);
            idx.insert(self.eq.hash(new), node);
        }
        self.version += 1;
        let new = self.items[node as usize].as_ref().expect("live node holds an item");
        self.events.emit(Event::Replaced { index, old: &old, new });
        self.events.changed();
        return Ok(old);
    }

    fn scope_insert(&mut self, scope: Scope, index: usize, item: T) -> Result<bool> {
        let bounds = self.bounds(scope);
        check_position(index, bounds.count)?;
        if self.lookup(&item).is_some() {
            return Ok(false);
        }
        self.reserve(1)?;
        let prev = self.order.prev(self.node_at(bounds, index));
        let next = self.order.next(prev);
        let (node, _) = self.splice(prev, vec![item]);
        self.fix_insert(scope, prev, next, node, node, 1);
        self.version += 1;
        self.events.emit(Event::Inserted { index, item: self.items[node as usize].as_ref().expect("just stored") });
        self.events.changed();
        return Ok(true);
    }

    fn scope_insert_all(&mut self, scope: Scope, index: usize, items: Vec<T>) -> Result<usize> {
        let bounds = self.bounds(scope);
        check_position(index, bounds.count)?;
        let items = self.admit(items);
        let k = items.len();
        if k == 0 {
            return Ok(0);
        }
        self.reserve(k)?;
        let prev = self.order.prev(self.node_at(bounds, index));
        let next = self.order.next(prev);
        let (first, last) = self.splice(prev, items);
        self.fix_insert(scope, prev, next, first, last, k);
        self.version += 1;
        let mut node = prev;
        for _ in 0..k {
            node = self.order.next(node);
            let item = self.items[node as usize].as_ref().expect("just stored");
            self.events.emit(Event::Added { item, count: 1 });
        }
        self.events.changed();
        return Ok(k);
    }

    fn scope_remove_at(&mut self, scope: Scope, index: usize) -> Result<T> {
        let bounds = self.bounds(scope);
        check_index(index, bounds.count)?;
        let node = self.node_at(bounds, index);
        let item = self.take_node(scope, node);
        self.events.emit(Event::RemovedAt { index, item: &item });
        self.events.changed();
        return Ok(item);
    }

    fn scope_remove(&mut self, scope: Scope, item: &T) -> Option<T> {
        let bounds = self.bounds(scope);
        let node = match self.lookup(item) {
            Some(node) if self.order.precedes(bounds.start, node) && self.order.precedes(node, bounds.end) => node,
            Some(_) => return None,
            None if self.index.is_some() => return None,
            None => {
                let index = self.scope_find(scope, item, false)?;
                self.node_at(bounds, index)
            }
        };
        let removed = self.take_node(scope, node);
        self.events.emit(Event::Removed { item: &removed, count: 1 });
        self.events.changed();
        return Some(removed);
    }

    fn scope_remove_all_copies(&mut self, scope: Scope, item: &T) -> usize {
        if self.index.is_some() {
            return self.scope_remove(scope, item).map_or(0, |_| 1);
        }
        let bounds = self.bounds(scope);
        let removed = self.sweep_remove(scope, bounds.start, bounds.end, |eq, x| eq.equals(x, item));
        if removed.is_empty() {
            return 0;
        }
        self.emit_removed(&removed);
        return removed.len();
    }

    fn scope_remove_interval(&mut self, scope: Scope, start: usize, count: usize) -> Result<()> {
        let bounds = self.bounds(scope);
        check_range(start, count, bounds.count)?;
        if count == 0 {
            return Ok(());
        }
        let from = self.order.prev(self.node_at(bounds, start));
        let to = self.node_at(bounds, start + count);
        self.sweep_remove(scope, from, to, |_, _| true);
        self.events.emit(Event::Cleared { full: false, count, offset: Some(start) });
        self.events.changed();
        return Ok(());
    }

    fn scope_remove_where<F: FnMut(&T) -> bool>(&mut self, scope: Scope, mut pred: F) -> usize {
        let bounds = self.bounds(scope);
        let removed = self.sweep_remove(scope, bounds.start, bounds.end, |_, x| pred(x));
        if removed.is_empty() {
            return 0;
        }
        self.emit_removed(&removed);
        return removed.len();
    }

    fn scope_clear(&mut self, scope: Scope) {
        let bounds = self.bounds(scope);
        if bounds.count == 0 {
            return;
        }
        if scope == Scope::Root {
            self.reset();
        } else {
            self.sweep_remove(scope, bounds.start, bounds.end, |_, _| true);
        }
        self.events.emit(Event::Cleared { full: scope == Scope::Root, count: bounds.count, offset: None });
        self.events.changed();
    }

    fn scope_reverse(&mut self, scope: Scope) {
        let range = self.bounds(scope);
        if range.count < 2 {
            return;
        }
        let nodes = self.nodes_of(range);
        self.fix_reorder(scope, range, &nodes, true);
        self.permute(range, &nodes, |values| values.reverse());
    }

    fn scope_sort_by<F: FnMut(&T, &T) -> Ordering>(&mut self, scope: Scope, mut cmp: F) {
        let range = self.bounds(scope);
        if range.count < 2 {
            return;
        }
        let nodes = self.nodes_of(range);
        if nodes.windows(2).all(|pair| cmp(self.item(pair[0]), self.item(pair[1])) != Ordering::Greater) {
            return;
        }
        self.fix_reorder(scope, range, &nodes, false);
        self.permute(range, &nodes, |values| values.sort_by(cmp));
    }

    fn scope_shuffle<R: Rng + ?Sized>(&mut self, scope: Scope, rng: &mut R) {
        let range = self.bounds(scope);
        if range.count < 2 {
            return;
        }
        let nodes = self.nodes_of(range);
        let mut perm: Vec<usize> = (0..nodes.len()).collect();
        perm.shuffle(rng);
        if perm.iter().enumerate().all(|(i, &from)| i == from) {
            return;
        }
        self.fix_reorder(scope, range, &nodes, false);
        self.permute(range, &nodes, |values| apply_permutation(values, &perm));
    }

    fn scope_view(&mut self, scope: Scope, start: usize, count: usize) -> Result<ViewId> {
        let bounds = self.bounds(scope);
        check_range(start, count, bounds.count)?;
        let first = self.node_at(bounds, start);
        let before = self.order.prev(first);
        let mut after = first;
        for _ in 0..count {
            after = self.order.next(after);
        }
        return Ok(self.views.register(Bounds { start: before, end: after, count }));
    }

    fn view_slide(&mut self, slot: u32, delta: isize, size: usize) -> Result<()> {
        let current = *self.views.bounds(slot);
        let offset = self.offset_of(current);
        let root = self.bounds(Scope::Root);
        match offset.checked_add_signed(delta) {
            Some(target) if target.checked_add(size).is_some_and(|end| end <= self.len) => {
                let first = self.node_at(root, target);
                let mut after = first;
                for _ in 0..size {
                    after = self.order.next(after);
                }
                let start = self.order.prev(first);
                *self.views.bounds_mut(slot) = Bounds { start, end: after, count: size };
                return Ok(());
            }
            _ => {
                return Err(Error::RangeOutOfBounds {
                    start: offset.saturating_add_signed(delta),
                    count: size,
                    len: self.len,
                });
            }
        }
    }

    fn view_span(&mut self, slot: u32, other: ViewId) -> Result<Option<ViewId>> {
        let other = *self.views.bounds(self.views.resolve(other)?);
        let this = *self.views.bounds(slot);
        let first = self.order.next(this.start);
        if self.order.precedes(other.end, first) {
            return Ok(None);
        }
        let mut count = 0;
        let mut node = first;
        while node != other.end {
            node = self.order.next(node);
            count += 1;
        }
        return Ok(Some(self.views.register(Bounds { start: this.start, end: other.end, count })));
    }

    fn view_release(&mut self, id: ViewId) -> bool {
        return self.views.dispose(id);
    }
}

impl<T, E: Equality<T>> Sequence<T> for LinkedList<T, E> {
    type Backing = Self;

    fn backing(&self) -> (&Self, Scope) {
        return (self, Scope::Root);
    }

    fn backing_mut(&mut self) -> (&mut Self, Scope) {
        return (self, Scope::Root);
    }
}

impl<T, E: Equality<T>> Root<T> for LinkedList<T, E> {
    fn window(&mut self, id: ViewId) -> Result<Window<'_, T, Self>> {
        return LinkedList::window(self, id);
    }

    fn version(&self) -> u64 {
        return self.version;
    }

    fn view_state(&self, id: ViewId) -> ViewState {
        return self.views.state(id);
    }

    fn view_offset(&self, id: ViewId) -> Result<usize> {
        return LinkedList::view_offset(self, id);
    }

    fn view_len(&self, id: ViewId) -> Result<usize> {
        return LinkedList::view_len(self, id);
    }

    fn dispose_view(&mut self, id: ViewId) -> bool {
        return self.views.dispose(id);
    }

    fn cursor(&self, view: Option<ViewId>) -> Result<Cursor> {
        return LinkedList::cursor(self, view);
    }

    fn advance(&self, cursor: &mut Cursor) -> Result<Option<&T>> {
        return LinkedList::advance(self, cursor);
    }

    fn subscribe<L: Listener<T> + 'static>(&mut self, listener: L) {
        self.events.subscribe(Box::new(listener));
    }

    fn check_invariants(&self) {
        LinkedList::check_invariants(self);
    }
}
