//! The operations shared by lists and views.
//!
//! Both engines implement [`Backing`], a set of operations parameterised by
//! a [`Scope`]. [`Sequence`] turns those into the public API: a root list
//! acts with `Scope::Root`, a [`Window`] acts with the scope of its view.
//! Indices passed to and returned by `Sequence` methods are always relative
//! to the list or view they are called on.

use std::cmp::Ordering;
use std::marker::PhantomData;

use rand::Rng;

use crate::error::Error;
use crate::error::Result;
use crate::event::Listener;
use crate::view::Scope;
use crate::view::ViewId;
use crate::view::ViewState;

/// Scoped primitives implemented by each engine.
#[doc(hidden)]
pub trait Backing<T> {
    fn scope_len(&self, scope: Scope) -> usize;
    fn scope_offset(&self, scope: Scope) -> usize;
    fn scope_get(&self, scope: Scope, index: usize) -> Result<&T>;
    fn scope_iter<'a>(&'a self, scope: Scope) -> impl Iterator<Item = &'a T>
    where
        T: 'a;
    fn scope_find(&self, scope: Scope, item: &T, from_back: bool) -> Option<usize>;
    fn scope_count_of(&self, scope: Scope, item: &T) -> usize;

    fn scope_set(&mut self, scope: Scope, index: usize, item: T) -> Result<T>;
    fn scope_insert(&mut self, scope: Scope, index: usize, item: T) -> Result<bool>;
    fn scope_insert_all(&mut self, scope: Scope, index: usize, items: Vec<T>) -> Result<usize>;
    fn scope_remove_at(&mut self, scope: Scope, index: usize) -> Result<T>;
    fn scope_remove(&mut self, scope: Scope, item: &T) -> Option<T>;
    fn scope_remove_all_copies(&mut self, scope: Scope, item: &T) -> usize;
    fn scope_remove_interval(&mut self, scope: Scope, start: usize, count: usize) -> Result<()>;
    fn scope_remove_where<F: FnMut(&T) -> bool>(&mut self, scope: Scope, pred: F) -> usize;
    fn scope_clear(&mut self, scope: Scope);
    fn scope_reverse(&mut self, scope: Scope);
    fn scope_sort_by<F: FnMut(&T, &T) -> Ordering>(&mut self, scope: Scope, cmp: F);
    fn scope_shuffle<R: Rng + ?Sized>(&mut self, scope: Scope, rng: &mut R);
    fn scope_view(&mut self, scope: Scope, start: usize, count: usize) -> Result<ViewId>;

    fn view_slide(&mut self, slot: u32, delta: isize, size: usize) -> Result<()>;
    fn view_span(&mut self, slot: u32, other: ViewId) -> Result<Option<ViewId>>;
    fn view_release(&mut self, id: ViewId) -> bool;
}

/// An index-addressable sequence: a whole list or a live view of one.
///
/// ```
/// use viewlist::{ArrayList, Sequence};
///
/// let mut list: ArrayList<u32> = (1..=5).collect();
/// let id = list.view(1, 3).unwrap();
/// let mut window = list.window(id).unwrap();
/// window.reverse();
/// assert_eq!(window.to_vec(), vec![4, 3, 2]);
/// assert_eq!(list.to_vec(), vec![1, 4, 3, 2, 5]);
/// ```
pub trait Sequence<T> {
    #[doc(hidden)]
    type Backing: Backing<T>;

    #[doc(hidden)]
    fn backing(&self) -> (&Self::Backing, Scope);

    #[doc(hidden)]
    fn backing_mut(&mut self) -> (&mut Self::Backing, Scope);

    // === Reads ===

    fn len(&self) -> usize {
        let (list, scope) = self.backing();
        return list.scope_len(scope);
    }

    fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// Position of the first item in the root list. Zero for a root.
    fn offset(&self) -> usize {
        let (list, scope) = self.backing();
        return list.scope_offset(scope);
    }

    fn get(&self, index: usize) -> Result<&T> {
        let (list, scope) = self.backing();
        return list.scope_get(scope, index);
    }

    fn first(&self) -> Result<&T> {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        return self.get(0);
    }

    fn last(&self) -> Result<&T> {
        let len = self.len();
        if len == 0 {
            return Err(Error::Empty);
        }
        return self.get(len - 1);
    }

    fn iter<'a>(&'a self) -> impl Iterator<Item = &'a T>
    where
        T: 'a,
        Self::Backing: 'a,
    {
        let (list, scope) = self.backing();
        return list.scope_iter(scope);
    }

    fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        return self.iter().cloned().collect();
    }

    // === Searches ===
    //
    // Membership always goes through the list's equality comparer. Hashed
    // lists answer from their index.

    fn contains(&self, item: &T) -> bool {
        return self.index_of(item).is_some();
    }

    fn index_of(&self, item: &T) -> Option<usize> {
        let (list, scope) = self.backing();
        return list.scope_find(scope, item, false);
    }

    fn last_index_of(&self, item: &T) -> Option<usize> {
        let (list, scope) = self.backing();
        return list.scope_find(scope, item, true);
    }

    fn count_of(&self, item: &T) -> usize {
        let (list, scope) = self.backing();
        return list.scope_count_of(scope, item);
    }

    fn is_sorted_by<F: FnMut(&T, &T) -> Ordering>(&self, mut cmp: F) -> bool {
        let mut items = self.iter();
        let Some(mut prev) = items.next() else {
            return true;
        };
        for item in items {
            if cmp(prev, item) == Ordering::Greater {
                return false;
            }
            prev = item;
        }
        return true;
    }

    // === Insertion and replacement ===

    /// Replaces the item at `index`, returning the old one.
    fn set(&mut self, index: usize, item: T) -> Result<T> {
        let (list, scope) = self.backing_mut();
        return list.scope_set(scope, index, item);
    }

    /// Inserts at `index`. A hashed list returns `Ok(false)` and stays
    /// unchanged if it already holds an equal item.
    fn insert(&mut self, index: usize, item: T) -> Result<bool> {
        let (list, scope) = self.backing_mut();
        return list.scope_insert(scope, index, item);
    }

    fn push_front(&mut self, item: T) -> Result<bool> {
        return self.insert(0, item);
    }

    fn push_back(&mut self, item: T) -> Result<bool> {
        let len = self.len();
        return self.insert(len, item);
    }

    /// Inserts a batch at `index`, preserving its order. Returns how many
    /// items were placed; a hashed list skips items already present and
    /// repeats within the batch.
    fn insert_all<I: IntoIterator<Item = T>>(&mut self, index: usize, items: I) -> Result<usize> {
        let (list, scope) = self.backing_mut();
        return list.scope_insert_all(scope, index, items.into_iter().collect());
    }

    fn extend_back<I: IntoIterator<Item = T>>(&mut self, items: I) -> Result<usize> {
        let len = self.len();
        return self.insert_all(len, items);
    }

    // === Removal ===

    fn remove_at(&mut self, index: usize) -> Result<T> {
        let (list, scope) = self.backing_mut();
        return list.scope_remove_at(scope, index);
    }

    fn pop_front(&mut self) -> Result<T> {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        return self.remove_at(0);
    }

    fn pop_back(&mut self) -> Result<T> {
        let len = self.len();
        if len == 0 {
            return Err(Error::Empty);
        }
        return self.remove_at(len - 1);
    }

    /// Removes the first item equal to `item`.
    fn remove(&mut self, item: &T) -> Option<T> {
        let (list, scope) = self.backing_mut();
        return list.scope_remove(scope, item);
    }

    fn remove_all_copies(&mut self, item: &T) -> usize {
        let (list, scope) = self.backing_mut();
        return list.scope_remove_all_copies(scope, item);
    }

    /// Removes `count` items starting at `start`.
    fn remove_interval(&mut self, start: usize, count: usize) -> Result<()> {
        let (list, scope) = self.backing_mut();
        return list.scope_remove_interval(scope, start, count);
    }

    /// Removes every item matching `pred` in one pass. Returns the number
    /// removed.
    fn remove_all_where<F: FnMut(&T) -> bool>(&mut self, pred: F) -> usize {
        let (list, scope) = self.backing_mut();
        return list.scope_remove_where(scope, pred);
    }

    /// Keeps only the items matching `keep`. Returns the number removed.
    fn retain<F: FnMut(&T) -> bool>(&mut self, mut keep: F) -> usize {
        return self.remove_all_where(move |item| !keep(item));
    }

    fn clear(&mut self) {
        let (list, scope) = self.backing_mut();
        list.scope_clear(scope);
    }

    // === Reordering ===
    //
    // Other views lying inside the reordered range are mirrored by a
    // reversal and invalidated by a sort or shuffle. Views partially
    // overlapping it are always invalidated.

    fn reverse(&mut self) {
        let (list, scope) = self.backing_mut();
        list.scope_reverse(scope);
    }

    /// Stable sort.
    fn sort_by<F: FnMut(&T, &T) -> Ordering>(&mut self, cmp: F) {
        let (list, scope) = self.backing_mut();
        list.scope_sort_by(scope, cmp);
    }

    fn sort(&mut self)
    where
        T: Ord,
    {
        self.sort_by(|a, b| a.cmp(b));
    }

    fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let (list, scope) = self.backing_mut();
        list.scope_shuffle(scope, rng);
    }

    // === Views ===

    /// Registers a view of `count` items starting at `start`.
    fn view(&mut self, start: usize, count: usize) -> Result<ViewId> {
        let (list, scope) = self.backing_mut();
        return list.scope_view(scope, start, count);
    }

    /// A one-item view of the first item equal to `item`.
    fn view_of(&mut self, item: &T) -> Option<ViewId> {
        let index = self.index_of(item)?;
        return self.view(index, 1).ok();
    }

    /// A one-item view of the last item equal to `item`.
    fn last_view_of(&mut self, item: &T) -> Option<ViewId> {
        let index = self.last_index_of(item)?;
        return self.view(index, 1).ok();
    }
}

/// Mutable access to a live view.
///
/// A window borrows its list exclusively, so the view cannot be invalidated
/// or disposed by anyone else while the window exists.
pub struct Window<'a, T, L> {
    list: &'a mut L,
    id: ViewId,
    slot: u32,
    _item: PhantomData<fn() -> T>,
}

impl<'a, T, L: Backing<T>> Window<'a, T, L> {
    /// Wraps a handle that has already been resolved to `slot`.
    pub(crate) fn new(list: &'a mut L, id: ViewId, slot: u32) -> Window<'a, T, L> {
        return Window { list, id, slot, _item: PhantomData };
    }

    pub fn id(&self) -> ViewId {
        return self.id;
    }

    /// Moves the view `delta` items along the root, keeping its size.
    pub fn slide(&mut self, delta: isize) -> Result<()> {
        let size = self.len();
        return self.list.view_slide(self.slot, delta, size);
    }

    /// Moves the view `delta` items along the root and resizes it.
    pub fn slide_to(&mut self, delta: isize, size: usize) -> Result<()> {
        return self.list.view_slide(self.slot, delta, size);
    }

    /// Like `slide_to`, leaving the view untouched when the target does not
    /// fit the root.
    pub fn try_slide(&mut self, delta: isize, size: usize) -> bool {
        return self.slide_to(delta, size).is_ok();
    }

    /// A new view from the start of this one to the end of `other`, or
    /// `None` if `other` ends before this view starts.
    pub fn span(&mut self, other: ViewId) -> Result<Option<ViewId>> {
        return self.list.view_span(self.slot, other);
    }

    /// Releases the view.
    pub fn dispose(self) {
        self.list.view_release(self.id);
    }
}

impl<'a, T, L: Backing<T>> Sequence<T> for Window<'a, T, L> {
    type Backing = L;

    fn backing(&self) -> (&L, Scope) {
        return (&*self.list, Scope::View(self.slot));
    }

    fn backing_mut(&mut self) -> (&mut L, Scope) {
        return (&mut *self.list, Scope::View(self.slot));
    }
}

/// The operations only a root list can perform: resolving view handles,
/// versioning and detached traversal.
///
/// Both engines implement these as inherent methods too; the trait lets
/// code stay generic over the engine.
pub trait Root<T>: Sequence<T> + Backing<T> + Sized {
    fn window(&mut self, id: ViewId) -> Result<Window<'_, T, Self>>;
    fn version(&self) -> u64;
    fn view_state(&self, id: ViewId) -> ViewState;
    fn view_offset(&self, id: ViewId) -> Result<usize>;
    fn view_len(&self, id: ViewId) -> Result<usize>;
    fn dispose_view(&mut self, id: ViewId) -> bool;
    fn cursor(&self, view: Option<ViewId>) -> Result<Cursor>;
    fn advance(&self, cursor: &mut Cursor) -> Result<Option<&T>>;
    fn subscribe<L: Listener<T> + 'static>(&mut self, listener: L);
    fn check_invariants(&self);
}

/// A detached traversal position.
///
/// Unlike `iter`, a cursor does not borrow the list between steps. It
/// records the list version when created; advancing after any change to the
/// list fails with [`Error::ConcurrentModification`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub(crate) version: u64,
    /// Next array index or node.
    pub(crate) next: usize,
    pub(crate) remaining: usize,
}

impl Cursor {
    /// Items not yet visited.
    pub fn remaining(&self) -> usize {
        return self.remaining;
    }

    /// Fails if the list moved on since the cursor was created.
    pub(crate) fn check(&self, version: u64) -> Result<()> {
        if self.version != version {
            return Err(Error::ConcurrentModification { expected: self.version, found: version });
        }
        return Ok(());
    }
}

/// Reorders `items` so that `items[i]` becomes the old `items[perm[i]]`.
pub(crate) fn apply_permutation<T>(items: &mut [T], perm: &[usize]) {
    debug_assert_eq!(items.len(), perm.len());
    let mut done = vec![false; perm.len()];
    for start in 0..perm.len() {
        if done[start] {
            continue;
        }
        done[start] = true;
        let mut at = start;
        loop {
            let from = perm[at];
            if from == start {
                break;
            }
            items.swap(at, from);
            done[from] = true;
            at = from;
        }
    }
}
