//! Secondary item → location index for hashed lists.
//!
//! Buckets are keyed by the comparer's hash. The index never looks at items
//! itself: lookups take a `matches` callback that compares the probe
//! against the item stored at a candidate location.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

#[derive(Clone, Debug)]
pub(crate) struct HashIndex<L> {
    buckets: FxHashMap<u64, SmallVec<[L; 1]>>,
    len: usize,
}

impl<L: Copy + Eq> HashIndex<L> {
    pub(crate) fn new() -> HashIndex<L> {
        return HashIndex {
            buckets: FxHashMap::default(),
            len: 0,
        };
    }

    /// Number of recorded locations.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        return self.len;
    }

    pub(crate) fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }

    /// First location in the bucket for `hash` accepted by `matches`.
    pub(crate) fn find(&self, hash: u64, mut matches: impl FnMut(L) -> bool) -> Option<L> {
        let bucket = self.buckets.get(&hash)?;
        return bucket.iter().copied().find(|loc| matches(*loc));
    }

    pub(crate) fn insert(&mut self, hash: u64, loc: L) {
        self.buckets.entry(hash).or_default().push(loc);
        self.len += 1;
    }

    /// Forgets one location. Returns `false` if it was not recorded.
    pub(crate) fn remove(&mut self, hash: u64, loc: L) -> bool {
        let Some(bucket) = self.buckets.get_mut(&hash) else {
            return false;
        };
        let Some(at) = bucket.iter().position(|l| *l == loc) else {
            return false;
        };
        bucket.swap_remove(at);
        if bucket.is_empty() {
            self.buckets.remove(&hash);
        }
        self.len -= 1;
        return true;
    }

    /// Re-records a moved range.
    ///
    /// `fresh` lists the current `(hash, location)` of every item in the
    /// range; `stale` accepts any location the range covered before the move.
    /// Pass one drops stale entries of the affected buckets, pass two records
    /// the fresh ones.
    pub(crate) fn reindex(&mut self, fresh: &[(u64, L)], stale: impl Fn(L) -> bool) {
        for (hash, _) in fresh {
            let Some(bucket) = self.buckets.get_mut(hash) else {
                continue;
            };
            let before = bucket.len();
            bucket.retain(|loc| !stale(*loc));
            self.len -= before - bucket.len();
            if bucket.is_empty() {
                self.buckets.remove(hash);
            }
        }
        for (hash, loc) in fresh {
            self.insert(*hash, *loc);
        }
    }

    /// Every recorded `(hash, location)` pair, in no particular order.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (u64, L)> + '_ {
        return self
            .buckets
            .iter()
            .flat_map(|(hash, bucket)| bucket.iter().map(move |loc| (*hash, *loc)));
    }
}
