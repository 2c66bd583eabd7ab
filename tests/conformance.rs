//! Conformance test suite for list engines.
//!
//! Every engine, plain and hashed, must pass these tests. They cover:
//!
//! 1. Basic operations: positional insert, remove, replace, search
//! 2. Bulk operations: batches, intervals, predicates, clear
//! 3. Permutations: reverse, sort, shuffle
//! 4. View fix-ups and the view lifecycle
//! 5. Cursors, versions and events
//!
//! Items are kept distinct so the hashed variants behave like the plain ones.
//!
//! # Usage
//!
//! To test a new engine, add it to the `run_conformance_tests!` invocations
//! at the bottom of this file.

use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use viewlist::{ArrayList, Error, ErrorKind, Event, LinkedList, Root, Sequence, ViewState};

fn filled<R: Root<u32>>(make_empty: &impl Fn() -> R, n: u32) -> R {
    let mut list = make_empty();
    list.extend_back(0..n).unwrap();
    return list;
}

// =============================================================================
// Basic Operation Tests
// =============================================================================

/// Test that inserts at the front, back and middle land where asked.
pub fn test_positional_insert<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = make_empty();
    assert_eq!(list.insert(0, 2), Ok(true));
    assert_eq!(list.push_front(0), Ok(true));
    assert_eq!(list.push_back(3), Ok(true));
    assert_eq!(list.insert(1, 1), Ok(true));
    assert_eq!(list.to_vec(), vec![0, 1, 2, 3]);
    assert_eq!(list.len(), 4);
    assert_eq!(list.first(), Ok(&0));
    assert_eq!(list.last(), Ok(&3));
    list.check_invariants();
}

/// Test that out-of-range positions are rejected without changes.
pub fn test_bad_positions<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 3);
    assert_eq!(list.insert(4, 9), Err(Error::IndexOutOfRange { index: 4, len: 3 }));
    assert_eq!(list.get(3), Err(Error::IndexOutOfRange { index: 3, len: 3 }));
    assert_eq!(list.remove_at(7).map_err(|e| e.kind()), Err(ErrorKind::Argument));
    assert_eq!(list.remove_interval(2, 2), Err(Error::RangeOutOfBounds { start: 2, count: 2, len: 3 }));
    assert!(list.view(1, 3).is_err());
    assert_eq!(list.to_vec(), vec![0, 1, 2]);
    assert_eq!(list.version(), 1);
}

/// Test the empty list edge cases.
pub fn test_empty_list<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = make_empty();
    assert!(list.is_empty());
    assert_eq!(list.first(), Err(Error::Empty));
    assert_eq!(list.last(), Err(Error::Empty));
    assert_eq!(list.pop_front(), Err(Error::Empty));
    assert_eq!(list.pop_back(), Err(Error::Empty));
    list.clear();
    list.reverse();
    list.sort();
    assert_eq!(list.version(), 0);
    list.check_invariants();
}

/// Test removal by position and from either end.
pub fn test_remove_at<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 6);
    assert_eq!(list.remove_at(2), Ok(2));
    assert_eq!(list.pop_front(), Ok(0));
    assert_eq!(list.pop_back(), Ok(5));
    assert_eq!(list.to_vec(), vec![1, 3, 4]);
    list.check_invariants();
}

/// Test that set returns the old item.
pub fn test_set<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 4);
    assert_eq!(list.set(1, 10), Ok(1));
    assert_eq!(list.to_vec(), vec![0, 10, 2, 3]);
    assert_eq!(list.index_of(&10), Some(1));
    assert!(!list.contains(&1));
    list.check_invariants();
}

/// Test searches from both ends.
pub fn test_search<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let list = filled(&make_empty, 8);
    assert_eq!(list.index_of(&5), Some(5));
    assert_eq!(list.last_index_of(&5), Some(5));
    assert_eq!(list.index_of(&42), None);
    assert_eq!(list.count_of(&3), 1);
    assert_eq!(list.count_of(&42), 0);
    assert!(list.contains(&7));
}

/// Test removal by value.
pub fn test_remove_item<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 5);
    assert_eq!(list.remove(&3), Some(3));
    assert_eq!(list.remove(&3), None);
    assert_eq!(list.remove_all_copies(&4), 1);
    assert_eq!(list.remove_all_copies(&4), 0);
    assert_eq!(list.to_vec(), vec![0, 1, 2]);
    list.check_invariants();
}

// =============================================================================
// Bulk Operation Tests
// =============================================================================

/// Test that a batch keeps its order.
pub fn test_insert_all<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 3);
    assert_eq!(list.insert_all(1, [10, 11, 12]), Ok(3));
    assert_eq!(list.to_vec(), vec![0, 10, 11, 12, 1, 2]);
    assert_eq!(list.insert_all(0, []), Ok(0));
    list.check_invariants();
}

/// Test interval removal.
pub fn test_remove_interval<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 10);
    list.remove_interval(2, 5).unwrap();
    assert_eq!(list.to_vec(), vec![0, 1, 7, 8, 9]);
    list.remove_interval(0, 0).unwrap();
    assert_eq!(list.len(), 5);
    list.check_invariants();
}

/// Test predicate removal and retain.
pub fn test_remove_where<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 12);
    assert_eq!(list.remove_all_where(|x| x % 3 == 0), 4);
    assert_eq!(list.retain(|x| *x < 8), 3);
    assert_eq!(list.to_vec(), vec![1, 2, 4, 5, 7]);
    assert_eq!(list.remove_all_where(|_| false), 0);
    list.check_invariants();
}

/// Test that clear empties the list and reuse works afterwards.
pub fn test_clear<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 20);
    list.clear();
    assert!(list.is_empty());
    list.check_invariants();
    list.extend_back([5, 6]).unwrap();
    assert_eq!(list.to_vec(), vec![5, 6]);
    list.check_invariants();
}

// =============================================================================
// Permutation Tests
// =============================================================================

/// Test reverse of the whole list.
pub fn test_reverse<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 5);
    list.reverse();
    assert_eq!(list.to_vec(), vec![4, 3, 2, 1, 0]);
    assert_eq!(list.index_of(&4), Some(0));
    list.check_invariants();
}

/// Test sorting with the natural and a custom order.
pub fn test_sort<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = make_empty();
    list.extend_back([5, 1, 4, 2, 3]).unwrap();
    list.sort();
    assert_eq!(list.to_vec(), vec![1, 2, 3, 4, 5]);
    assert!(list.is_sorted_by(|a, b| a.cmp(b)));
    list.sort_by(|a, b| b.cmp(a));
    assert_eq!(list.to_vec(), vec![5, 4, 3, 2, 1]);
    assert_eq!(list.index_of(&1), Some(4));
    list.check_invariants();
}

/// Test that shuffle keeps the same items.
pub fn test_shuffle<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 50);
    let mut rng = StdRng::seed_from_u64(3);
    list.shuffle(&mut rng);
    let mut items = list.to_vec();
    assert_ne!(items, (0..50).collect::<Vec<_>>());
    items.sort();
    assert_eq!(items, (0..50).collect::<Vec<_>>());
    list.check_invariants();
}

// =============================================================================
// View Tests
// =============================================================================

/// Test that an insert strictly before a view shifts it.
pub fn test_view_shifts<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 5);
    let v = list.view(2, 2).unwrap();
    list.insert(1, 10).unwrap();
    assert_eq!(list.view_offset(v), Ok(3));
    assert_eq!(list.view_len(v), Ok(2));
    assert_eq!(list.window(v).unwrap().to_vec(), vec![2, 3]);
    list.check_invariants();
}

/// Test that an insert strictly inside a view grows it.
pub fn test_view_grows<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 5);
    let v = list.view(1, 3).unwrap();
    list.insert_all(2, [10, 11]).unwrap();
    assert_eq!(list.view_offset(v), Ok(1));
    assert_eq!(list.window(v).unwrap().to_vec(), vec![1, 10, 11, 2, 3]);
    list.check_invariants();
}

/// Test inserts at the edges of views, including empty views.
pub fn test_view_edges<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 4);
    let v = list.view(1, 2).unwrap();
    let empty = list.view(2, 0).unwrap();
    list.insert(3, 10).unwrap();
    list.insert(1, 11).unwrap();
    assert_eq!(list.to_vec(), vec![0, 11, 1, 2, 10, 3]);
    assert_eq!(list.window(v).unwrap().to_vec(), vec![1, 2]);
    assert_eq!(list.view_offset(empty), Ok(3));
    list.insert(3, 12).unwrap();
    assert_eq!(list.view_offset(empty), Ok(3));
    assert_eq!(list.view_len(empty), Ok(0));
    assert_eq!(list.window(v).unwrap().to_vec(), vec![1, 12, 2]);
    list.check_invariants();
}

/// Test edits through a view: indices are relative and siblings follow.
pub fn test_edit_through_view<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 6);
    let v = list.view(2, 2).unwrap();
    let after = list.view(4, 2).unwrap();
    let around = list.view(1, 4).unwrap();
    {
        let mut window = list.window(v).unwrap();
        assert_eq!(window.offset(), 2);
        assert_eq!(window.get(0), Ok(&2));
        window.push_back(10).unwrap();
        window.push_front(11).unwrap();
        assert_eq!(window.remove_at(1), Ok(2));
        assert_eq!(window.to_vec(), vec![11, 3, 10]);
    }
    assert_eq!(list.to_vec(), vec![0, 1, 11, 3, 10, 4, 5]);
    assert_eq!(list.window(after).unwrap().to_vec(), vec![4, 5]);
    assert_eq!(list.window(around).unwrap().to_vec(), vec![1, 11, 3, 10, 4]);
    list.check_invariants();
}

/// Test that removal shrinks views and never invalidates them.
pub fn test_view_removal<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 10);
    let v = list.view(3, 4).unwrap();
    let left = list.view(0, 4).unwrap();
    list.remove_interval(2, 6).unwrap();
    assert_eq!(list.to_vec(), vec![0, 1, 8, 9]);
    assert_eq!(list.view_state(v), ViewState::Live);
    assert_eq!(list.view_len(v), Ok(0));
    assert_eq!(list.view_offset(v), Ok(2));
    assert_eq!(list.window(left).unwrap().to_vec(), vec![0, 1]);
    list.check_invariants();
}

/// Test clearing a view and reusing it.
pub fn test_clear_view<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 8);
    let v = list.view(2, 3).unwrap();
    let right = list.view(4, 4).unwrap();
    let all = list.view(0, 8).unwrap();
    list.window(v).unwrap().clear();
    assert_eq!(list.to_vec(), vec![0, 1, 5, 6, 7]);
    assert_eq!(list.window(right).unwrap().to_vec(), vec![5, 6, 7]);
    assert_eq!(list.view_len(all), Ok(5));
    list.window(v).unwrap().push_back(20).unwrap();
    assert_eq!(list.to_vec(), vec![0, 1, 20, 5, 6, 7]);
    assert_eq!(list.window(right).unwrap().to_vec(), vec![5, 6, 7]);
    list.check_invariants();
}

/// Test compaction with views whose ends are removed.
pub fn test_view_compaction<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 12);
    let a = list.view(2, 5).unwrap();
    let b = list.view(6, 6).unwrap();
    let c = list.view(0, 3).unwrap();
    assert_eq!(list.remove_all_where(|x| x % 2 == 0), 6);
    assert_eq!(list.to_vec(), vec![1, 3, 5, 7, 9, 11]);
    assert_eq!(list.window(a).unwrap().to_vec(), vec![3, 5]);
    assert_eq!(list.window(b).unwrap().to_vec(), vec![7, 9, 11]);
    assert_eq!(list.window(c).unwrap().to_vec(), vec![1]);
    list.check_invariants();
}

/// Test reversal: contained views are mirrored, overlapping ones invalidated.
pub fn test_view_reverse<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 5);
    let whole = list.view(0, 5).unwrap();
    let inner = list.view(0, 2).unwrap();
    list.reverse();
    assert_eq!(list.view_state(whole), ViewState::Live);
    assert_eq!(list.window(whole).unwrap().to_vec(), vec![4, 3, 2, 1, 0]);
    assert_eq!(list.view_offset(inner), Ok(3));
    assert_eq!(list.window(inner).unwrap().to_vec(), vec![1, 0]);

    let region = list.view(1, 3).unwrap();
    let partial = list.view(3, 2).unwrap();
    list.window(region).unwrap().reverse();
    assert_eq!(list.to_vec(), vec![4, 1, 2, 3, 0]);
    assert_eq!(list.view_state(partial), ViewState::Invalidated);
    assert_eq!(list.window(partial).err(), Some(Error::Invalidated));
    assert_eq!(list.view_len(whole), Ok(5));
    list.check_invariants();
}

/// Test sort and shuffle invalidate contained views.
pub fn test_view_sort<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = make_empty();
    list.extend_back([4, 2, 3, 1, 0]).unwrap();
    let inner = list.view(1, 2).unwrap();
    let outside = list.view(0, 1).unwrap();
    let region = list.view(1, 4).unwrap();
    list.window(region).unwrap().sort();
    assert_eq!(list.to_vec(), vec![4, 0, 1, 2, 3]);
    assert_eq!(list.view_state(inner), ViewState::Invalidated);
    assert_eq!(list.view_state(outside), ViewState::Live);
    assert_eq!(list.window(region).unwrap().to_vec(), vec![0, 1, 2, 3]);

    let inner = list.view(2, 2).unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let before = list.version();
    while list.version() == before {
        list.window(region).unwrap().shuffle(&mut rng);
    }
    assert_eq!(list.view_state(inner), ViewState::Invalidated);
    list.check_invariants();
}

/// Test views created through views, and searching views.
pub fn test_nested_views<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 10);
    let outer = list.view(2, 6).unwrap();
    let inner = list.window(outer).unwrap().view(1, 3).unwrap();
    assert_eq!(list.view_offset(inner), Ok(3));
    assert_eq!(list.window(inner).unwrap().to_vec(), vec![3, 4, 5]);
    assert_eq!(list.window(outer).unwrap().index_of(&5), Some(3));
    assert_eq!(list.window(outer).unwrap().index_of(&9), None);

    let found = list.window(outer).unwrap().view_of(&6).unwrap();
    assert_eq!(list.view_offset(found), Ok(6));
    assert_eq!(list.window(found).unwrap().to_vec(), vec![6]);
    assert!(list.window(outer).unwrap().last_view_of(&0).is_none());

    list.insert(0, 20).unwrap();
    assert_eq!(list.window(inner).unwrap().to_vec(), vec![3, 4, 5]);
    assert_eq!(list.view_offset(inner), Ok(4));
    list.check_invariants();
}

/// Test sliding and spanning windows.
pub fn test_slide_and_span<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 10);
    let a = list.view(1, 2).unwrap();
    let b = list.view(5, 2).unwrap();
    let spanned = list.window(a).unwrap().span(b).unwrap().unwrap();
    assert_eq!(list.window(spanned).unwrap().to_vec(), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(list.window(b).unwrap().span(a), Ok(None));
    {
        let mut window = list.window(a).unwrap();
        window.slide(3).unwrap();
        assert_eq!(window.to_vec(), vec![4, 5]);
        assert!(!window.try_slide(5, 3));
        assert!(window.try_slide(-4, 3));
        assert_eq!(window.to_vec(), vec![0, 1, 2]);
        assert!(window.slide(-1).is_err());
    }
    assert_eq!(list.view_offset(a), Ok(0));
    list.check_invariants();
}

/// Test the view lifecycle: dispose, stale handles.
pub fn test_view_lifecycle<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 4);
    let v = list.view(1, 2).unwrap();
    list.window(v).unwrap().dispose();
    assert_eq!(list.view_state(v), ViewState::Disposed);
    assert_eq!(list.window(v).err(), Some(Error::Disposed));
    assert_eq!(list.view_len(v), Err(Error::Disposed));
    assert!(!list.dispose_view(v));

    let w = list.view(0, 1).unwrap();
    assert_eq!(w.slot(), v.slot());
    assert_eq!(list.view_state(v), ViewState::Disposed);
    assert_eq!(list.view_state(w), ViewState::Live);
    assert!(list.dispose_view(w));
}

// =============================================================================
// Traversal, Version and Event Tests
// =============================================================================

/// Test detached cursors.
pub fn test_cursor<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 6);
    let v = list.view(2, 3).unwrap();
    let mut cursor = list.cursor(Some(v)).unwrap();
    assert_eq!(cursor.remaining(), 3);
    let mut seen = Vec::new();
    while let Some(item) = list.advance(&mut cursor).unwrap() {
        seen.push(*item);
    }
    assert_eq!(seen, vec![2, 3, 4]);

    let mut cursor = list.cursor(None).unwrap();
    assert_eq!(list.advance(&mut cursor), Ok(Some(&0)));
    list.push_back(9).unwrap();
    assert_eq!(
        list.advance(&mut cursor).map_err(|e| e.kind()),
        Err(ErrorKind::ConcurrentModification)
    );
}

/// Test that each mutating call moves the version once and no-op calls leave it.
pub fn test_versions<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = make_empty();
    list.extend_back([1, 2, 3]).unwrap();
    let start = list.version();
    list.sort();
    list.remove_all_where(|_| false);
    list.remove_interval(1, 0).unwrap();
    list.insert_all(0, []).unwrap();
    assert_eq!(list.version(), start);
    list.set(0, 1).unwrap();
    assert_eq!(list.version(), start + 1);
    list.reverse();
    assert_eq!(list.version(), start + 2);
    list.remove_all_where(|x| *x > 1);
    assert_eq!(list.version(), start + 3);
}

/// Test events arrive specific-first with one trailing `Changed`.
pub fn test_events<R: Root<u32>>(make_empty: impl Fn() -> R) {
    let mut list = filled(&make_empty, 5);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    list.subscribe(move |event: &Event<'_, u32>| {
        sink.borrow_mut().push(format!("{:?}", event));
    });

    list.set(0, 10).unwrap();
    list.remove_interval(1, 2).unwrap();
    list.reverse();
    list.clear();
    list.clear();

    assert_eq!(
        *seen.borrow(),
        vec![
            "Replaced { index: 0, old: 0, new: 10 }",
            "Changed",
            "Cleared { full: false, count: 2, offset: Some(1) }",
            "Changed",
            "Reordered { count: 3 }",
            "Changed",
            "Cleared { full: true, count: 3, offset: None }",
            "Changed",
        ]
    );
}

// =============================================================================
// Test Runner Macro
// =============================================================================

/// Macro to run all conformance tests for an engine.
#[macro_export]
macro_rules! run_conformance_tests {
    ($name:ident, $make_empty:expr) => {
        mod $name {
            use super::*;

            #[test]
            fn positional_insert() {
                test_positional_insert($make_empty);
            }

            #[test]
            fn bad_positions() {
                test_bad_positions($make_empty);
            }

            #[test]
            fn empty_list() {
                test_empty_list($make_empty);
            }

            #[test]
            fn remove_at() {
                test_remove_at($make_empty);
            }

            #[test]
            fn set() {
                test_set($make_empty);
            }

            #[test]
            fn search() {
                test_search($make_empty);
            }

            #[test]
            fn remove_item() {
                test_remove_item($make_empty);
            }

            #[test]
            fn insert_all() {
                test_insert_all($make_empty);
            }

            #[test]
            fn remove_interval() {
                test_remove_interval($make_empty);
            }

            #[test]
            fn remove_where() {
                test_remove_where($make_empty);
            }

            #[test]
            fn clear() {
                test_clear($make_empty);
            }

            #[test]
            fn reverse() {
                test_reverse($make_empty);
            }

            #[test]
            fn sort() {
                test_sort($make_empty);
            }

            #[test]
            fn shuffle() {
                test_shuffle($make_empty);
            }

            #[test]
            fn view_shifts() {
                test_view_shifts($make_empty);
            }

            #[test]
            fn view_grows() {
                test_view_grows($make_empty);
            }

            #[test]
            fn view_edges() {
                test_view_edges($make_empty);
            }

            #[test]
            fn edit_through_view() {
                test_edit_through_view($make_empty);
            }

            #[test]
            fn view_removal() {
                test_view_removal($make_empty);
            }

            #[test]
            fn clear_view() {
                test_clear_view($make_empty);
            }

            #[test]
            fn view_compaction() {
                test_view_compaction($make_empty);
            }

            #[test]
            fn view_reverse() {
                test_view_reverse($make_empty);
            }

            #[test]
            fn view_sort() {
                test_view_sort($make_empty);
            }

            #[test]
            fn nested_views() {
                test_nested_views($make_empty);
            }

            #[test]
            fn slide_and_span() {
                test_slide_and_span($make_empty);
            }

            #[test]
            fn view_lifecycle() {
                test_view_lifecycle($make_empty);
            }

            #[test]
            fn cursor() {
                test_cursor($make_empty);
            }

            #[test]
            fn versions() {
                test_versions($make_empty);
            }

            #[test]
            fn events() {
                test_events($make_empty);
            }
        }
    };
}

// =============================================================================
// Tests for engines
// =============================================================================

fn make_array() -> ArrayList<u32> {
    return ArrayList::new();
}

fn make_hashed_array() -> ArrayList<u32> {
    return ArrayList::hashed();
}

fn make_linked() -> LinkedList<u32> {
    return LinkedList::new();
}

fn make_hashed_linked() -> LinkedList<u32> {
    return LinkedList::hashed();
}

run_conformance_tests!(array, make_array);
run_conformance_tests!(hashed_array, make_hashed_array);
run_conformance_tests!(linked, make_linked);
run_conformance_tests!(hashed_linked, make_hashed_linked);
