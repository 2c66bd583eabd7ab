//! Node links with an order-maintenance index.
//!
//! Every node carries a `(group tag, local tag)` key such that list order
//! equals key order, so `precedes` is two integer comparisons. Nodes are
//! bucketed into tag groups of bounded size:
//!
//! ```text
//!  HEAD │ g0: n n n │ g1: n n │ g2: n n n n │ TAIL
//!  MIN  │ tag -9000 │ tag 12  │ tag 70000   │ MAX
//! ```
//!
//! - Inserting between two nodes takes the midpoint local tag when there is
//!   room. A crowded group is split; groups at the edges grow outward.
//! - When group tags run out of room, an aligned window of the group tag
//!   space around the crowded group is re-spaced. The window doubles until
//!   its density is acceptable, so the amortized cost stays logarithmic.
//! - Small groups merge with their smaller neighbour.
//!
//! Nodes live in a `Vec` arena indexed by `u32` with a free list. Node 0 is
//! the head sentinel and node 1 the tail sentinel, each in its own group
//! pinned at the ends of the tag space.

use tracing::debug;

use crate::config::Config;

/// Sentinel value for no node / no group.
pub(crate) const NONE: u32 = u32::MAX;
/// Node before the first item.
pub(crate) const HEAD: u32 = 0;
/// Node after the last item.
pub(crate) const TAIL: u32 = 1;

const HEAD_GROUP: u32 = 0;
const TAIL_GROUP: u32 = 1;

/// Per-node links and order key.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Link {
    pub(crate) prev: u32,
    pub(crate) next: u32,
    group: u32,
    tag: i32,
}

impl Link {
    fn vacant() -> Link {
        return Link { prev: NONE, next: NONE, group: NONE, tag: 0 };
    }
}

#[derive(Clone, Copy, Debug)]
struct TagGroup {
    tag: i32,
    count: usize,
    first: u32,
    last: u32,
}

/// Maps an `i32` tag onto `0..=u32::MAX`, preserving order.
#[inline]
fn key_of(tag: i32) -> u64 {
    return (tag as i64 - i32::MIN as i64) as u64;
}

#[inline]
fn tag_of(key: u64) -> i32 {
    return (key as i64 + i32::MIN as i64) as i32;
}

/// The linked arena plus its tag groups.
#[derive(Clone, Debug)]
pub(crate) struct Order {
    links: Vec<Link>,
    free: Vec<u32>,
    groups: Vec<TagGroup>,
    free_groups: Vec<u32>,
    /// Groups other than the two sentinel groups.
    live_groups: usize,
    capacity: usize,
    low: usize,
}

impl Order {
    pub(crate) fn new(config: &Config) -> Order {
        let mut order = Order {
            links: Vec::new(),
            free: Vec::new(),
            groups: Vec::new(),
            free_groups: Vec::new(),
            live_groups: 0,
            capacity: config.group_capacity,
            low: config.group_low,
        };
        order.reset();
        return order;
    }

    /// Drops every node except the sentinels.
    pub(crate) fn reset(&mut self) {
        self.links.clear();
        self.links.push(Link { prev: NONE, next: TAIL, group: HEAD_GROUP, tag: 0 });
        self.links.push(Link { prev: HEAD, next: NONE, group: TAIL_GROUP, tag: 0 });
        self.free.clear();
        self.groups.clear();
        self.groups.push(TagGroup { tag: i32::MIN, count: 1, first: HEAD, last: HEAD });
        self.groups.push(TagGroup { tag: i32::MAX, count: 1, first: TAIL, last: TAIL });
        self.free_groups.clear();
        self.live_groups = 0;
    }

    #[inline]
    pub(crate) fn next(&self, node: u32) -> u32 {
        return self.links[node as usize].next;
    }

    #[inline]
    pub(crate) fn prev(&self, node: u32) -> u32 {
        return self.links[node as usize].prev;
    }

    /// Order key of a live node.
    #[inline]
    pub(crate) fn key(&self, node: u32) -> (i32, i32) {
        let link = &self.links[node as usize];
        return (self.groups[link.group as usize].tag, link.tag);
    }

    /// Whether `a` comes strictly before `b`.
    #[inline]
    pub(crate) fn precedes(&self, a: u32, b: u32) -> bool {
        return self.key(a) < self.key(b);
    }

    /// Number of arena slots, sentinels and vacant slots included.
    pub(crate) fn slots(&self) -> usize {
        return self.links.len();
    }

    pub(crate) fn slot_capacity(&self) -> usize {
        return self.links.capacity();
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.links.shrink_to_fit();
        self.groups.shrink_to_fit();
    }

    /// Number of non-sentinel tag groups.
    pub(crate) fn groups(&self) -> usize {
        return self.live_groups;
    }

    /// Links a new node right after `prev` and returns its index.
    pub(crate) fn insert_after(&mut self, prev: u32) -> u32 {
        let next = self.links[prev as usize].next;
        let node = self.alloc();
        self.tag_between(node, prev, next);
        self.links[node as usize].prev = prev;
        self.links[node as usize].next = next;
        self.links[prev as usize].next = node;
        self.links[next as usize].prev = node;
        return node;
    }

    /// Unlinks a node and releases its slot.
    pub(crate) fn remove(&mut self, node: u32) {
        debug_assert!(node != HEAD && node != TAIL, "sentinels are never removed");
        let Link { prev, next, group, .. } = self.links[node as usize];

        let g = &mut self.groups[group as usize];
        g.count -= 1;
        let survivor = g.count > 0;
        if survivor {
            if g.first == node {
                g.first = next;
            }
            if g.last == node {
                g.last = prev;
            }
        } else {
            self.free_group(group);
        }

        self.links[prev as usize].next = next;
        self.links[next as usize].prev = prev;
        self.links[node as usize] = Link::vacant();
        self.free.push(node);

        if survivor && self.groups[group as usize].count <= self.low {
            self.merge(group);
        }
    }

    fn alloc(&mut self) -> u32 {
        if let Some(node) = self.free.pop() {
            return node;
        }
        let node = self.links.len() as u32;
        self.links.push(Link::vacant());
        return node;
    }

    fn alloc_group(&mut self, group: TagGroup) -> u32 {
        self.live_groups += 1;
        if let Some(g) = self.free_groups.pop() {
            self.groups[g as usize] = group;
            return g;
        }
        let g = self.groups.len() as u32;
        self.groups.push(group);
        return g;
    }

    fn free_group(&mut self, g: u32) {
        self.groups[g as usize] = TagGroup { tag: 0, count: 0, first: NONE, last: NONE };
        self.free_groups.push(g);
        self.live_groups -= 1;
    }

    #[inline]
    fn next_group(&self, g: u32) -> u32 {
        let last = self.groups[g as usize].last;
        return self.links[self.links[last as usize].next as usize].group;
    }

    #[inline]
    fn prev_group(&self, g: u32) -> u32 {
        let first = self.groups[g as usize].first;
        return self.links[self.links[first as usize].prev as usize].group;
    }

    /// Gives `node` a key strictly between the keys of `p` and `s`, which
    /// are adjacent. Runs before `node` is linked.
    fn tag_between(&mut self, node: u32, p: u32, s: u32) {
        loop {
            let gp = self.links[p as usize].group;
            let gs = self.links[s as usize].group;
            let lo = self.links[p as usize].tag as i64;
            let hi = self.links[s as usize].tag as i64;

            if gp == gs {
                if hi - lo > 1 && self.groups[gp as usize].count < self.capacity {
                    self.join(node, gp, (lo + hi).div_euclid(2));
                    return;
                }
                self.split(gp);
                continue;
            }

            if gp != HEAD_GROUP && self.groups[gp as usize].count < self.capacity && lo < i32::MAX as i64 {
                self.join(node, gp, (lo + i32::MAX as i64 + 1).div_euclid(2));
                self.groups[gp as usize].last = node;
                return;
            }
            if gs != TAIL_GROUP && self.groups[gs as usize].count < self.capacity && hi > i32::MIN as i64 {
                self.join(node, gs, (i32::MIN as i64 - 1 + hi).div_euclid(2));
                self.groups[gs as usize].first = node;
                return;
            }

            if (self.groups[gs as usize].tag as i64) - (self.groups[gp as usize].tag as i64) < 2 {
                self.relabel(gp, 1);
            }
            let lo = self.groups[gp as usize].tag as i64;
            let hi = self.groups[gs as usize].tag as i64;
            let g = self.alloc_group(TagGroup {
                tag: (lo + hi).div_euclid(2) as i32,
                count: 1,
                first: node,
                last: node,
            });
            self.links[node as usize].group = g;
            self.links[node as usize].tag = 0;
            return;
        }
    }

    fn join(&mut self, node: u32, g: u32, tag: i64) {
        self.links[node as usize].group = g;
        self.links[node as usize].tag = tag as i32;
        self.groups[g as usize].count += 1;
    }

    /// Spreads the local tags of a group evenly over the `i32` range.
    fn respace(&mut self, g: u32) {
        let TagGroup { count, first, .. } = self.groups[g as usize];
        let step = (1i64 << 32) / (count as i64 + 1);
        let mut node = first;
        for i in 0..count {
            let link = &mut self.links[node as usize];
            link.tag = (i32::MIN as i64 + (i as i64 + 1) * step) as i32;
            node = link.next;
        }
    }

    /// Splits a crowded group into groups of at most half the capacity.
    fn split(&mut self, g: u32) {
        let count = self.groups[g as usize].count;
        let parts = count.div_ceil((self.capacity / 2).max(1));
        if parts <= 1 {
            self.respace(g);
            return;
        }

        let next = self.next_group(g);
        let room = self.groups[next as usize].tag as i64 - self.groups[g as usize].tag as i64;
        if room < parts as i64 {
            self.relabel(g, parts - 1);
        }
        let base = self.groups[g as usize].tag as i64;
        let room = self.groups[next as usize].tag as i64 - base;
        let chunk = count.div_ceil(parts);

        let mut node = self.groups[g as usize].first;
        let mut remaining = count;
        let mut target = g;
        for part in 0..parts {
            if remaining == 0 {
                break;
            }
            let take = chunk.min(remaining);
            if part > 0 {
                let tag = base + (part as i64 * room) / parts as i64;
                target = self.alloc_group(TagGroup { tag: tag as i32, count: 0, first: node, last: node });
            }
            let group_first = node;
            let mut group_last = node;
            for _ in 0..take {
                self.links[node as usize].group = target;
                group_last = node;
                node = self.links[node as usize].next;
            }
            let group = &mut self.groups[target as usize];
            group.first = group_first;
            group.last = group_last;
            group.count = take;
            remaining -= take;
            self.respace(target);
        }
        debug!(count, parts, "tag group split");
    }

    /// Merges a small group into its smaller neighbour when they fit.
    fn merge(&mut self, g: u32) {
        let before = self.prev_group(g);
        let after = self.next_group(g);
        let before_count = if before == HEAD_GROUP { None } else { Some(self.groups[before as usize].count) };
        let after_count = if after == TAIL_GROUP { None } else { Some(self.groups[after as usize].count) };
        let other = match (before_count, after_count) {
            (Some(b), Some(a)) if a < b => after,
            (Some(_), _) => before,
            (None, Some(_)) => after,
            (None, None) => return,
        };

        let own = self.groups[g as usize].count;
        let theirs = self.groups[other as usize].count;
        if own + theirs > self.capacity {
            return;
        }

        let (keep, absorb) = if other == before { (before, g) } else { (g, after) };
        let TagGroup { count, first, last, .. } = self.groups[absorb as usize];
        let mut node = first;
        for _ in 0..count {
            self.links[node as usize].group = keep;
            node = self.links[node as usize].next;
        }
        let group = &mut self.groups[keep as usize];
        group.count += count;
        group.last = last;
        self.free_group(absorb);
        self.respace(keep);
        debug!(merged = own + theirs, "tag groups merged");
    }

    /// Re-spaces the group tags of a window around `g`, leaving room for
    /// `extra` new groups right after `g`.
    fn relabel(&mut self, g: u32, extra: usize) {
        let center = key_of(self.groups[g as usize].tag);
        let base = ((self.live_groups + 1) as f64).powf(1.0 / 30.0);
        let mut limit = 1.0;
        let mut window: Vec<u32> = Vec::new();

        for bits in 1..=32u32 {
            limit *= base;
            let width = 1u64 << bits;
            let lo = center & !(width - 1);
            let hi = lo + width - 1;

            window.clear();
            let mut first = if g == HEAD_GROUP { self.next_group(HEAD_GROUP) } else { g };
            if g != HEAD_GROUP {
                loop {
                    let prev = self.prev_group(first);
                    if prev == HEAD_GROUP || key_of(self.groups[prev as usize].tag) < lo {
                        break;
                    }
                    first = prev;
                }
            }
            let mut cur = first;
            while cur != TAIL_GROUP && key_of(self.groups[cur as usize].tag) <= hi {
                window.push(cur);
                cur = self.next_group(cur);
            }

            let left = lo.saturating_sub(1);
            let right = (hi + 1).min(u32::MAX as u64);
            let slots = window.len() + extra;
            let delta = (right - left) / (slots as u64 + 1);
            if bits < 32 && (slots as f64 > limit || delta < 2) {
                continue;
            }

            let mut pos = if g == HEAD_GROUP { extra as u64 } else { 0 };
            for &group in &window {
                pos += 1;
                self.groups[group as usize].tag = tag_of(left + pos * delta);
                if group == g {
                    pos += extra as u64;
                }
            }
            debug!(bits, groups = window.len(), extra, "tag groups relabelled");
            return;
        }
    }

    /// Walks the list and asserts every structural invariant. Returns the
    /// number of non-sentinel nodes.
    pub(crate) fn check(&self) -> usize {
        let mut len = 0;
        let mut counts = vec![0usize; self.groups.len()];
        let mut prev = HEAD;
        let mut node = self.next(HEAD);
        assert_eq!(self.key(HEAD).0, i32::MIN, "head group pinned");
        while node != TAIL {
            assert!(node != NONE, "chain ends before the tail");
            assert_eq!(self.prev(node), prev, "prev link of {}", node);
            assert!(self.precedes(prev, node), "keys not increasing at {}", node);
            let group = self.links[node as usize].group;
            if counts[group as usize] == 0 {
                assert_eq!(self.groups[group as usize].first, node, "first of group {}", group);
            }
            counts[group as usize] += 1;
            if self.links[self.next(node) as usize].group != group {
                assert_eq!(self.groups[group as usize].last, node, "last of group {}", group);
            }
            len += 1;
            prev = node;
            node = self.next(node);
        }
        assert_eq!(self.prev(TAIL), prev, "prev link of tail");
        assert!(self.precedes(prev, TAIL), "keys not increasing at tail");

        let mut live = 0;
        for (g, group) in self.groups.iter().enumerate().skip(2) {
            if group.count == 0 {
                continue;
            }
            live += 1;
            assert_eq!(group.count, counts[g], "count of group {}", g);
            assert!(group.count <= self.capacity, "group {} over capacity", g);
        }
        assert_eq!(live, self.live_groups, "live group count");
        return len;
    }
}
