//! Equality comparers.
//!
//! Every membership test, search and hash computation goes through an
//! [`Equality`] value owned by the list. Reference identity is never assumed.

use std::hash::Hash;
use std::hash::Hasher;

use rustc_hash::FxHasher;

/// An externally supplied notion of item equality.
///
/// Comparers that can also hash set `HASHES = true` and override `hash`;
/// only those can back a hashed list.
pub trait Equality<T: ?Sized> {
    /// Whether `hash` is consistent with `equals`.
    const HASHES: bool = false;

    /// Returns `true` if `a` and `b` are the same item.
    fn equals(&self, a: &T, b: &T) -> bool;

    /// Hash consistent with `equals`. Only meaningful when `HASHES` is set.
    fn hash(&self, _item: &T) -> u64 {
        return 0;
    }
}

/// Equality and hashing taken from the item's own `Eq` and `Hash`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Natural;

impl<T: Eq + Hash + ?Sized> Equality<T> for Natural {
    const HASHES: bool = true;

    #[inline]
    fn equals(&self, a: &T, b: &T) -> bool {
        return a == b;
    }

    #[inline]
    fn hash(&self, item: &T) -> u64 {
        let mut hasher = FxHasher::default();
        item.hash(&mut hasher);
        return hasher.finish();
    }
}

/// Compares items by a projected key.
///
/// ```
/// use viewlist::{ByKey, Equality};
///
/// let by_len = ByKey(|s: &&str| s.len());
/// assert!(by_len.equals(&"abc", &"xyz"));
/// assert_eq!(by_len.hash(&"abc"), by_len.hash(&"xyz"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ByKey<F>(pub F);

impl<T: ?Sized, K: Eq + Hash, F: Fn(&T) -> K> Equality<T> for ByKey<F> {
    const HASHES: bool = true;

    #[inline]
    fn equals(&self, a: &T, b: &T) -> bool {
        return (self.0)(a) == (self.0)(b);
    }

    #[inline]
    fn hash(&self, item: &T) -> u64 {
        let mut hasher = FxHasher::default();
        (self.0)(item).hash(&mut hasher);
        return hasher.finish();
    }
}

/// Equality from a plain predicate. Cannot hash, so it cannot back a
/// hashed list.
#[derive(Clone, Copy, Debug)]
pub struct FnEquality<F>(pub F);

impl<T: ?Sized, F: Fn(&T, &T) -> bool> Equality<T> for FnEquality<F> {
    #[inline]
    fn equals(&self, a: &T, b: &T) -> bool {
        return (self.0)(a, b);
    }
}
