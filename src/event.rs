//! Change notifications.
//!
//! A list carries at most one [`Listener`]. Every public mutation reports
//! what it did with specific events first and a single [`Event::Changed`]
//! last; calls that change nothing report nothing.

use std::fmt;

/// One structured change notification. Indices are relative to the list or
/// view the operation was invoked on.
#[derive(Debug, PartialEq, Eq)]
pub enum Event<'a, T> {
    /// `item` was inserted at `index`.
    Inserted { index: usize, item: &'a T },
    /// `item` was removed from `index`.
    RemovedAt { index: usize, item: &'a T },
    /// `count` copies of `item` were added.
    Added { item: &'a T, count: usize },
    /// `count` copies of `item` were removed.
    Removed { item: &'a T, count: usize },
    /// The item at `index` was overwritten.
    Replaced { index: usize, old: &'a T, new: &'a T },
    /// `count` items were cleared. `full` is set when the whole list was
    /// emptied; `offset` is the start of a cleared sub-range.
    Cleared { full: bool, count: usize, offset: Option<usize> },
    /// All `count` items of the acting list or view were reordered in place.
    Reordered { count: usize },
    /// Aggregate signal, always last.
    Changed,
}

/// Receives change notifications from a list.
pub trait Listener<T> {
    fn notify(&mut self, event: &Event<'_, T>);
}

impl<T, F: FnMut(&Event<'_, T>)> Listener<T> for F {
    fn notify(&mut self, event: &Event<'_, T>) {
        self(event);
    }
}

/// Dispatcher owned by a root list.
pub(crate) struct Events<T> {
    listener: Option<Box<dyn Listener<T>>>,
}

impl<T> Events<T> {
    pub(crate) fn new() -> Events<T> {
        return Events { listener: None };
    }

    pub(crate) fn subscribe(&mut self, listener: Box<dyn Listener<T>>) {
        self.listener = Some(listener);
    }

    pub(crate) fn unsubscribe(&mut self) -> bool {
        return self.listener.take().is_some();
    }

    /// Whether anybody listens. Callers skip building events otherwise.
    #[inline]
    pub(crate) fn is_active(&self) -> bool {
        return self.listener.is_some();
    }

    #[inline]
    pub(crate) fn emit(&mut self, event: Event<'_, T>) {
        if let Some(listener) = self.listener.as_mut() {
            listener.notify(&event);
        }
    }

    /// Emits the aggregate signal that closes a public call.
    #[inline]
    pub(crate) fn changed(&mut self) {
        self.emit(Event::Changed);
    }
}

impl<T> fmt::Debug for Events<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.debug_struct("Events").field("active", &self.is_active()).finish();
    }
}
