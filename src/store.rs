use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;
use ahash::RandomState;

/// One heap slot. Empty slots rank below every occupied one, so they sit at the
/// root until the store fills up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot<T> {
    Empty,
    Occupied { item: T, count: u64, sequence: u64 },
}

impl<T> Slot<T> {
    #[inline]
    fn count(&self) -> u64 {
        match self {
            Slot::Empty => 0,
            Slot::Occupied { count, .. } => *count,
        }
    }
}

/// A fixed-capacity min-heap of (item, count) slots plus an item -> slot index.
///
/// The heap and the index are only ever changed together: every assignment or
/// swap of a slot updates the index in the same step.
pub(crate) struct TopKStore<T> {
    heap: Vec<Slot<T>>,
    index: HashMap<T, usize, RandomState>,  // item -> heap position
    sequence: u64,  // admission counter, used to order equal counts
}

impl<T: Clone + Hash + Eq> TopKStore<T> {
    pub(crate) fn with_capacity_and_hasher(capacity: usize, hasher: RandomState) -> Self {
        Self {
            heap: vec![Slot::Empty; capacity],
            index: HashMap::with_capacity_and_hasher(capacity, hasher),
            sequence: 0,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }

    pub(crate) fn capacity(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn get<Q>(&self, item: &Q) -> Option<u64>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(item).map(|&pos| self.heap[pos].count())
    }

    pub(crate) fn contains<Q>(&self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(item)
    }

    /// `None` while the root is an empty slot, i.e. the store is not yet full.
    pub(crate) fn root_count(&self) -> Option<u64> {
        match self.heap.first() {
            Some(Slot::Occupied { count, .. }) => Some(*count),
            _ => None,
        }
    }

    /// Adds one to a resident item's count. Returns false if the item is not resident.
    pub(crate) fn increment<Q>(&mut self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&pos) = self.index.get(item) else {
            return false;
        };
        if let Slot::Occupied { count, .. } = &mut self.heap[pos] {
            *count += 1;
        }
        // A larger count can only be out of order with the children of `pos`;
        // the parent was already <= the old count.
        self.sift_down(pos);
        true
    }

    /// Replaces the root slot with `item` at `count` and restores heap order.
    /// Returns the item that was evicted from the root, if any.
    pub(crate) fn replace_root(&mut self, item: T, count: u64) -> Option<T> {
        debug_assert!(!self.index.contains_key(&item), "item already resident");
        self.sequence += 1;
        let slot = Slot::Occupied { item: item.clone(), count, sequence: self.sequence };
        let evicted = match std::mem::replace(&mut self.heap[0], slot) {
            Slot::Occupied { item: old, .. } => {
                self.index.remove(&old);
                Some(old)
            }
            Slot::Empty => None,
        };
        self.index.insert(item, 0);
        self.sift_down(0);
        evicted
    }

    /// Resident entries ordered by count descending, then by admission order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&T, u64)> {
        let mut entries: Vec<_> = self
            .heap
            .iter()
            .filter_map(|slot| match slot {
                Slot::Occupied { item, count, sequence } => Some((item, *count, *sequence)),
                Slot::Empty => None,
            })
            .collect();

        entries.sort_unstable_by(|(_, c1, s1), (_, c2, s2)| by_rank(*c1, *s1, *c2, *s2));

        entries.into_iter().map(|(item, count, _)| (item, count))
    }

    /// Consumes the store, partially ordering the slots so that only the first
    /// `n` need a full sort.
    pub(crate) fn into_ranked(self, n: usize) -> Vec<(T, u64)> {
        let mut entries: Vec<_> = self
            .heap
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Occupied { item, count, sequence } => Some((item, count, sequence)),
                Slot::Empty => None,
            })
            .collect();

        let n = n.min(entries.len());
        if n == 0 {
            return Vec::new();
        }
        let cmp = |a: &(T, u64, u64), b: &(T, u64, u64)| by_rank(a.1, a.2, b.1, b.2);
        if n < entries.len() {
            entries.select_nth_unstable_by(n - 1, cmp);
            entries.truncate(n);
        }
        entries.sort_unstable_by(cmp);

        entries.into_iter().map(|(item, count, _)| (item, count)).collect()
    }

    // Binary heap helper methods using Eytzinger layout (0-based indexing)
    fn left(i: usize) -> usize { 2 * i + 1 }
    fn right(i: usize) -> usize { 2 * i + 2 }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let mut smallest = pos;
            let left = Self::left(pos);
            let right = Self::right(pos);

            if left < len && self.heap[left].count() < self.heap[smallest].count() {
                smallest = left;
            }
            if right < len && self.heap[right].count() < self.heap[smallest].count() {
                smallest = right;
            }

            if smallest == pos {
                break;
            }

            self.swap_nodes(pos, smallest);
            pos = smallest;
        }
    }

    fn swap_nodes(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        for pos in [i, j] {
            if let Slot::Occupied { item, .. } = &self.heap[pos] {
                if let Some(entry) = self.index.get_mut(item) {
                    *entry = pos;
                }
            }
        }
    }

    /// Panics if the heap order, the index or the capacity bound is broken.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        for i in 1..self.heap.len() {
            let parent = (i - 1) / 2;
            assert!(
                self.heap[parent].count() <= self.heap[i].count(),
                "heap order violated: parent {} has count {}, child {} has count {}",
                parent, self.heap[parent].count(), i, self.heap[i].count()
            );
        }

        let occupied = self.heap.iter().filter(|s| matches!(s, Slot::Occupied { .. })).count();
        assert_eq!(occupied, self.index.len(), "index has stale or duplicate entries");
        assert!(self.index.len() <= self.heap.len(), "capacity exceeded");

        for (pos, slot) in self.heap.iter().enumerate() {
            if let Slot::Occupied { item, count, .. } = slot {
                assert!(*count >= 1, "occupied slot {} has zero count", pos);
                assert_eq!(self.index.get(item), Some(&pos), "index points away from slot {}", pos);
            }
        }
    }
}

/// Higher count first; among equal counts the earlier admission first.
#[inline]
fn by_rank(c1: u64, s1: u64, c2: u64, s2: u64) -> Ordering {
    match c2.cmp(&c1) {
        Ordering::Equal => s1.cmp(&s2),
        other => other,
    }
}
