use std::borrow::Borrow;
use std::hash::Hash;

use crate::error::{Error, Result};
use crate::random::{SeededUniform, UniformSource};
use crate::store::TopKStore;

/// A resident item and its estimated frequency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<T> {
    pub item: T,
    pub count: u64,
}

impl<T> From<(T, u64)> for Node<T> {
    fn from((item, count): (T, u64)) -> Self {
        Node { item, count }
    }
}

/// Unbiased Space-Saving sketch tracking at most `capacity` items.
///
/// An item already resident has its count incremented. An unseen item takes
/// an empty slot while one exists. Once the sketch is full, an unseen item
/// replaces the minimum entry with probability `1 / (min + 1)` and inherits
/// `min + 1` as its count; otherwise it is dropped.
///
/// The sketch is not synchronized. Callers feeding it from several threads
/// must serialize calls to [`update`](Self::update).
pub struct UnbiasedSpaceSaving<T, R = SeededUniform> {
    store: TopKStore<T>,
    source: R,
    observed: u64,
}

impl<T: Clone + Hash + Eq> UnbiasedSpaceSaving<T> {
    /// Creates a sketch with `capacity` slots and a deterministic random source.
    ///
    /// Returns [`Error::InvalidCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize, seed: u64) -> Result<Self> {
        Self::with_source(capacity, SeededUniform::new(seed))
    }
}

impl<T: Clone + Hash + Eq, R: UniformSource> UnbiasedSpaceSaving<T, R> {
    /// Creates a sketch drawing its eviction decisions from `source`.
    pub fn with_source(capacity: usize, source: R) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        Ok(Self {
            store: TopKStore::with_capacity(capacity),
            source,
            observed: 0,
        })
    }

    /// Observes one occurrence of `item`.
    pub fn update(&mut self, item: T) {
        self.observed += 1;

        if self.store.increment(&item) {
            return;
        }

        match self.store.root_count() {
            // Not full yet: the root is an empty slot
            None => {
                self.store.replace_root(item, 1);
            }
            Some(min_count) => {
                let threshold = 1.0 / (min_count as f64 + 1.0);
                if self.source.next_f64() < threshold {
                    self.store.replace_root(item, min_count + 1);
                }
            }
        }
    }

    /// Returns up to `n` resident items ordered by estimated count, highest first.
    ///
    /// Equal counts are ordered by admission: the entry that entered its slot
    /// earlier comes first. The sketch is left untouched.
    pub fn top_n(&self, n: usize) -> Vec<Node<T>> {
        self.store
            .iter()
            .take(n)
            .map(|(item, count)| Node { item: item.clone(), count })
            .collect()
    }

    /// All resident items, ordered as in [`top_n`](Self::top_n).
    pub fn list(&self) -> Vec<Node<T>> {
        self.top_n(self.capacity())
    }

    /// Iterates resident items without cloning them, ordered as in [`top_n`](Self::top_n).
    pub fn iter(&self) -> impl Iterator<Item = (&T, u64)> {
        self.store.iter()
    }

    /// Consumes the sketch and returns its top `n` items.
    ///
    /// Cheaper than [`top_n`](Self::top_n) for small `n` since only the
    /// first `n` entries are fully sorted.
    pub fn into_top_n(self, n: usize) -> Vec<Node<T>> {
        self.store.into_ranked(n).into_iter().map(Node::from).collect()
    }

    /// Estimated count of `item`, or `None` if it is not resident.
    pub fn count<Q>(&self, item: &Q) -> Option<u64>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.get(item)
    }

    /// Whether `item` is currently resident.
    pub fn query<Q>(&self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.contains(item)
    }

    /// Smallest resident count, or 0 while empty slots remain.
    pub fn min_count(&self) -> u64 {
        self.store.root_count().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.store.len() == self.store.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Number of `update` calls so far.
    pub fn observed(&self) -> u64 {
        self.observed
    }
}

impl<T: Clone + Hash + Eq, R: UniformSource> Extend<T> for UnbiasedSpaceSaving<T, R> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.update(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::MockUniformSource;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn scripted(draws: Vec<f64>) -> MockUniformSource {
        let mut draws = draws.into_iter();
        let mut mock = MockUniformSource::new();
        mock.expect_next_f64()
            .returning(move || draws.next().expect("no draws left"));
        mock
    }

    fn never_drawn() -> MockUniformSource {
        let mut mock = MockUniformSource::new();
        mock.expect_next_f64().never();
        mock
    }

    #[test]
    fn test_new() {
        let sketch: UnbiasedSpaceSaving<u32> = UnbiasedSpaceSaving::new(10, 42).unwrap();
        assert_eq!(sketch.capacity(), 10);
        assert_eq!(sketch.len(), 0);
        assert!(sketch.is_empty());
        assert!(!sketch.is_full());
        assert_eq!(sketch.min_count(), 0);
        assert_eq!(sketch.observed(), 0);
        sketch.store.assert_invariants();
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = UnbiasedSpaceSaving::<u32>::new(0, 42);
        assert!(matches!(result, Err(Error::InvalidCapacity(0))));
    }

    #[test]
    fn test_single_item_never_draws() {
        let mut sketch = UnbiasedSpaceSaving::with_source(2, never_drawn()).unwrap();
        for _ in 0..4 {
            sketch.update("x");
            sketch.store.assert_invariants();
        }
        assert_eq!(sketch.len(), 1);
        assert_eq!(sketch.count("x"), Some(4));
        assert_eq!(sketch.list(), vec![Node { item: "x", count: 4 }]);
    }

    #[test]
    fn test_fill_without_draws() {
        let mut sketch = UnbiasedSpaceSaving::with_source(3, never_drawn()).unwrap();
        sketch.extend(["a", "b", "a", "c"]);
        assert!(sketch.is_full());
        assert_eq!(sketch.min_count(), 1);
        assert_eq!(sketch.count("a"), Some(2));
        assert_eq!(sketch.count("b"), Some(1));
        assert_eq!(sketch.count("c"), Some(1));
    }

    #[test]
    fn test_scenario_eviction() {
        // [A, A, B, C, D] with capacity 3: D arrives when min is 1, threshold 0.5
        let mut sketch = UnbiasedSpaceSaving::with_source(3, scripted(vec![0.25])).unwrap();
        sketch.extend(["A", "A", "B", "C", "D"]);
        sketch.store.assert_invariants();

        assert_eq!(sketch.len(), 3);
        assert_eq!(sketch.observed(), 5);
        assert!(!sketch.query("C"));
        assert_eq!(
            sketch.list(),
            vec![
                Node { item: "A", count: 2 },
                Node { item: "D", count: 2 },
                Node { item: "B", count: 1 },
            ]
        );
    }

    #[test]
    fn test_scenario_rejection() {
        let mut sketch = UnbiasedSpaceSaving::with_source(3, scripted(vec![0.75])).unwrap();
        sketch.extend(["A", "A", "B", "C", "D"]);
        sketch.store.assert_invariants();

        assert!(!sketch.query("D"));
        assert_eq!(
            sketch.list(),
            vec![
                Node { item: "A", count: 2 },
                Node { item: "B", count: 1 },
                Node { item: "C", count: 1 },
            ]
        );
    }

    fn full_sketch_with_min(min: u64, draw: f64) -> UnbiasedSpaceSaving<u32, MockUniformSource> {
        let mut sketch = UnbiasedSpaceSaving::with_source(2, scripted(vec![draw])).unwrap();
        for _ in 0..min {
            sketch.update(1);
            sketch.update(2);
        }
        assert_eq!(sketch.min_count(), min);
        sketch
    }

    #[test]
    fn test_eviction_just_below_threshold() {
        for min in [1u64, 3, 9] {
            let threshold = 1.0 / (min as f64 + 1.0);
            let below = threshold - f64::EPSILON;
            let mut sketch = full_sketch_with_min(min, below);
            sketch.update(3);
            assert_eq!(sketch.count(&3), Some(min + 1), "min {}", min);
            assert_eq!(sketch.len(), 2);
            sketch.store.assert_invariants();
        }
    }

    #[test]
    fn test_no_eviction_at_threshold() {
        for min in [1u64, 3, 9] {
            let threshold = 1.0 / (min as f64 + 1.0);
            let mut sketch = full_sketch_with_min(min, threshold);
            sketch.update(3);
            assert!(!sketch.query(&3), "min {}", min);
            assert_eq!(sketch.count(&1), Some(min));
            assert_eq!(sketch.count(&2), Some(min));
        }
    }

    #[test]
    fn test_no_eviction_above_threshold() {
        for min in [1u64, 3, 9] {
            let threshold = 1.0 / (min as f64 + 1.0);
            let mut sketch = full_sketch_with_min(min, threshold + 1e-9);
            sketch.update(3);
            assert!(!sketch.query(&3), "min {}", min);
            assert_eq!(sketch.len(), 2);
        }
    }

    #[test]
    fn test_eviction_removes_root_only() {
        let mut sketch = UnbiasedSpaceSaving::with_source(3, scripted(vec![0.0])).unwrap();
        sketch.extend([1u32, 1, 1, 2, 2, 3]);
        // 3 is the minimum and gets evicted
        sketch.update(4);
        sketch.store.assert_invariants();
        assert!(!sketch.query(&3));
        assert_eq!(sketch.count(&4), Some(2));
        assert_eq!(sketch.count(&1), Some(3));
        assert_eq!(sketch.count(&2), Some(2));
    }

    #[test]
    fn test_top_n_zero() {
        let mut sketch = UnbiasedSpaceSaving::new(4, 7).unwrap();
        assert!(sketch.top_n(0).is_empty());
        sketch.extend(0u32..100);
        assert!(sketch.top_n(0).is_empty());
        assert!(sketch.into_top_n(0).is_empty());
    }

    #[test]
    fn test_top_n_clamps_and_is_repeatable() {
        let mut sketch = UnbiasedSpaceSaving::with_source(4, never_drawn()).unwrap();
        sketch.extend(["a", "b", "b", "c", "c", "c"]);

        let top = sketch.top_n(100);
        assert_eq!(top.len(), 3);
        assert_eq!(top, sketch.top_n(100));
        assert_eq!(sketch.top_n(2), top[..2].to_vec());

        // Query does not disturb further tracking
        sketch.update("d");
        assert!(sketch.is_full());
        sketch.store.assert_invariants();
    }

    #[test]
    fn test_into_top_n_matches_top_n() {
        let mut sketch = UnbiasedSpaceSaving::new(16, 4177).unwrap();
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..5_000 {
            let x: u32 = rng.random_range(0..64);
            sketch.update(x * x % 97);
        }
        let expected = sketch.top_n(5);
        assert_eq!(sketch.into_top_n(5), expected);
    }

    #[test]
    fn test_iter_matches_list() {
        let mut sketch = UnbiasedSpaceSaving::new(8, 1).unwrap();
        sketch.extend("the quick brown fox jumps over the lazy dog the end".split(' '));
        let from_iter: Vec<_> = sketch.iter().map(|(item, count)| Node { item: *item, count }).collect();
        assert_eq!(from_iter, sketch.list());
        assert_eq!(sketch.list()[0], Node { item: "the", count: 3 });
    }

    #[test]
    fn test_string_items_borrowed_lookup() {
        let mut sketch = UnbiasedSpaceSaving::new(4, 3).unwrap();
        for word in ["alpha", "beta", "alpha"] {
            sketch.update(word.to_string());
        }
        assert_eq!(sketch.count("alpha"), Some(2));
        assert!(sketch.query("beta"));
        assert!(!sketch.query("gamma"));
    }

    #[test]
    fn test_same_seed_same_result() {
        let stream: Vec<u32> = {
            let mut rng = SmallRng::seed_from_u64(11);
            (0..10_000).map(|_| rng.random_range(0..500)).collect()
        };
        let mut a = UnbiasedSpaceSaving::new(20, 4177).unwrap();
        let mut b = UnbiasedSpaceSaving::new(20, 4177).unwrap();
        a.extend(stream.iter().copied());
        b.extend(stream.iter().copied());
        assert_eq!(a.list(), b.list());
    }

    #[test]
    fn test_invariants_under_random_stream() {
        let mut rng = SmallRng::seed_from_u64(1234);
        for capacity in [1usize, 2, 3, 7, 16] {
            let mut sketch = UnbiasedSpaceSaving::new(capacity, capacity as u64).unwrap();
            let mut last_seen = std::collections::HashMap::new();
            for _ in 0..3_000 {
                // Skewed ids: small ids are much more frequent
                let a: u32 = rng.random_range(1..40);
                let item = rng.random_range(0..a);
                sketch.update(item);
                sketch.store.assert_invariants();
                assert!(sketch.len() <= capacity);

                let count = sketch.count(&item);
                if let (Some(prev), Some(now)) = (last_seen.get(&item).copied(), count) {
                    assert!(now >= prev, "count of {} went from {} to {}", item, prev, now);
                }
                match count {
                    Some(now) => last_seen.insert(item, now),
                    None => last_seen.remove(&item),
                };
                // Evicted items lose their history
                last_seen.retain(|k, _| sketch.query(k));
            }
        }
    }

    #[test]
    fn test_increment_keeps_heap_order() {
        // Increments only ever need a downward repair; check it on every step
        let mut sketch = UnbiasedSpaceSaving::with_source(7, never_drawn()).unwrap();
        sketch.extend(0u32..7);
        for round in 0..20u32 {
            for item in 0..7u32 {
                if (item + round) % 3 != 0 {
                    sketch.update(item);
                    sketch.store.assert_invariants();
                }
            }
        }
    }

    #[test]
    fn test_top_n_descending() {
        let mut sketch = UnbiasedSpaceSaving::new(10, 99).unwrap();
        for i in 0..100u32 {
            for _ in 0..=i {
                sketch.update(i);
            }
        }
        let top = sketch.list();
        assert_eq!(top.len(), 10);
        for pair in top.windows(2) {
            assert!(pair[0].count >= pair[1].count,
                "Items not properly ordered by count: {} before {}",
                pair[0].count, pair[1].count);
        }
    }

    #[test]
    fn test_admission_rate_matches_threshold() {
        // With min count 1 a newcomer is admitted half the time
        let trials = 10_000;
        let mut admitted = 0;
        let mut source = SeededUniform::new(4177);
        for _ in 0..trials {
            let mut sketch = UnbiasedSpaceSaving::with_source(1, &mut source).unwrap();
            sketch.update(1u32);
            sketch.update(2u32);
            if sketch.query(&2) {
                admitted += 1;
            }
        }
        let rate = admitted as f64 / trials as f64;
        assert!((rate - 0.5).abs() < 0.03, "admission rate {}", rate);
    }
}
