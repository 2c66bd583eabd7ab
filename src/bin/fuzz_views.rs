//! AFL fuzz harness for list views
//!
//! Drives an ArrayList and a LinkedList with the same byte-decoded
//! operations and checks:
//! 1. Agreement: both engines hold the same items
//! 2. Views: every view has the same state, offset and length in both
//! 3. Consistency: each engine passes its own invariant checks

use afl::fuzz;
use viewlist::{ArrayList, LinkedList, Root, Sequence, ViewId, ViewState};

/// Operation types the fuzzer can generate
#[derive(Debug, Clone, Copy)]
enum FuzzOp {
    /// Insert `len` items at a fraction of the acting scope
    Insert { scope: u8, pos_frac: u8, len: u8 },
    /// Remove a run starting at a fraction of the acting scope
    Remove { scope: u8, pos_frac: u8, len: u8 },
    /// Remove every item divisible by `modulus`
    RemoveWhere { scope: u8, modulus: u8 },
    Reverse { scope: u8 },
    Sort { scope: u8 },
    Clear { scope: u8 },
    /// Open a view over a fraction of the acting scope
    View { scope: u8, pos_frac: u8, len: u8 },
}

impl FuzzOp {
    fn from_bytes(bytes: &[u8]) -> Option<(FuzzOp, &[u8])> {
        let (&tag, rest) = bytes.split_first()?;
        match tag % 7 {
            0 if rest.len() >= 3 => {
                let op = FuzzOp::Insert { scope: rest[0], pos_frac: rest[1], len: rest[2] % 8 + 1 };
                return Some((op, &rest[3..]));
            }
            1 if rest.len() >= 3 => {
                let op = FuzzOp::Remove { scope: rest[0], pos_frac: rest[1], len: rest[2] % 8 };
                return Some((op, &rest[3..]));
            }
            2 if rest.len() >= 2 => {
                let op = FuzzOp::RemoveWhere { scope: rest[0], modulus: rest[1] % 4 + 2 };
                return Some((op, &rest[2..]));
            }
            3 if !rest.is_empty() => return Some((FuzzOp::Reverse { scope: rest[0] }, &rest[1..])),
            4 if !rest.is_empty() => return Some((FuzzOp::Sort { scope: rest[0] }, &rest[1..])),
            5 if !rest.is_empty() => return Some((FuzzOp::Clear { scope: rest[0] }, &rest[1..])),
            6 if rest.len() >= 3 => {
                let op = FuzzOp::View { scope: rest[0], pos_frac: rest[1], len: rest[2] };
                return Some((op, &rest[3..]));
            }
            _ => return None,
        }
    }

    fn scope(&self) -> u8 {
        return match *self {
            FuzzOp::Insert { scope, .. }
            | FuzzOp::Remove { scope, .. }
            | FuzzOp::RemoveWhere { scope, .. }
            | FuzzOp::Reverse { scope }
            | FuzzOp::Sort { scope }
            | FuzzOp::Clear { scope }
            | FuzzOp::View { scope, .. } => scope,
        };
    }
}

/// Picks the root or a live view. Both engines must agree on liveness,
/// which `compare` checks after every step.
fn pick<R: Root<u32>>(list: &R, ids: &[ViewId], scope: u8) -> Option<ViewId> {
    let i = scope as usize % (ids.len() + 1);
    if i == 0 || list.view_state(ids[i - 1]) != ViewState::Live {
        return None;
    }
    return Some(ids[i - 1]);
}

fn run<S: Sequence<u32>>(seq: &mut S, op: FuzzOp, next: &mut u32) -> Option<ViewId> {
    let len = seq.len();
    let at = |frac: u8, len: usize| frac as usize * (len + 1) / 256;
    match op {
        FuzzOp::Insert { pos_frac, len: n, .. } => {
            let items: Vec<u32> = (0..n as u32).map(|i| (*next + i) % 13).collect();
            *next += n as u32;
            seq.insert_all(at(pos_frac, len), items).unwrap();
        }
        FuzzOp::Remove { pos_frac, len: n, .. } => {
            let start = at(pos_frac, len);
            let count = (n as usize).min(len - start);
            seq.remove_interval(start, count).unwrap();
        }
        FuzzOp::RemoveWhere { modulus, .. } => {
            seq.remove_all_where(|x| x % modulus as u32 == 0);
        }
        FuzzOp::Reverse { .. } => seq.reverse(),
        FuzzOp::Sort { .. } => seq.sort(),
        FuzzOp::Clear { .. } => seq.clear(),
        FuzzOp::View { pos_frac, len: n, .. } => {
            let start = at(pos_frac, len);
            let count = (n as usize).min(len - start);
            return Some(seq.view(start, count).unwrap());
        }
    }
    return None;
}

fn step<R: Root<u32>>(list: &mut R, ids: &mut Vec<ViewId>, op: FuzzOp, next: &mut u32) {
    let created = match pick(list, ids, op.scope()) {
        None => run(list, op, next),
        Some(id) => run(&mut list.window(id).expect("picked a live view"), op, next),
    };
    ids.extend(created);
}

fn compare(array: &mut ArrayList<u32>, a_ids: &[ViewId], linked: &mut LinkedList<u32>, l_ids: &[ViewId]) {
    array.check_invariants();
    linked.check_invariants();
    assert_eq!(array.to_vec(), linked.to_vec(), "content mismatch");
    assert_eq!(a_ids.len(), l_ids.len(), "view count mismatch");
    for (a, l) in a_ids.iter().zip(l_ids) {
        assert_eq!(array.view_state(*a), linked.view_state(*l), "view state mismatch");
        if array.view_state(*a) == ViewState::Live {
            assert_eq!(array.view_offset(*a), linked.view_offset(*l), "view offset mismatch");
            assert_eq!(array.view_len(*a), linked.view_len(*l), "view length mismatch");
        }
    }
}

fn main() {
    fuzz!(|data: &[u8]| {
        let mut array: ArrayList<u32> = ArrayList::new();
        let mut linked: LinkedList<u32> = LinkedList::new();
        let mut a_ids = Vec::new();
        let mut l_ids = Vec::new();
        let (mut a_next, mut l_next) = (0, 0);
        let mut remaining = data;

        while let Some((op, rest)) = FuzzOp::from_bytes(remaining) {
            remaining = rest;
            step(&mut array, &mut a_ids, op, &mut a_next);
            step(&mut linked, &mut l_ids, op, &mut l_next);
            compare(&mut array, &a_ids, &mut linked, &l_ids);
        }
    });
}
