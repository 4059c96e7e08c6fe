//! Randomized selection over a candidate set.
//!
//! The sampler owns its random source so tests can inject a seeded one and
//! assert exact orderings; production code uses [`Sampler::from_entropy`].

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub struct Sampler<R = StdRng> {
    rng: Mutex<R>,
}

impl Sampler<StdRng> {
    /// OS-seeded generator; every call draws fresh values from it.
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic generator for reproducible orderings.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for Sampler<StdRng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl<R: Rng> Sampler<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Uniformly shuffle `candidates` (Fisher–Yates) and keep at most `count`.
    ///
    /// Asking for more than there are returns every candidate.
    pub fn sample<T>(&self, mut candidates: Vec<T>, count: usize) -> Vec<T> {
        if count == 0 {
            return Vec::new();
        }
        // A poisoned lock only means another caller panicked mid-shuffle;
        // the generator state is still usable.
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        candidates.shuffle(&mut *rng);
        candidates.truncate(count);
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn same_seed_same_order() {
        let a = Sampler::seeded(7).sample((0..20).collect::<Vec<_>>(), 20);
        let b = Sampler::seeded(7).sample((0..20).collect::<Vec<_>>(), 20);
        assert_eq!(a, b);
    }

    #[test]
    fn consecutive_calls_draw_fresh_values() {
        let sampler = Sampler::seeded(7);
        let draws: HashSet<Vec<i32>> = (0..10)
            .map(|_| sampler.sample((0..20).collect(), 20))
            .collect();
        assert!(draws.len() > 1);
    }

    #[test]
    fn count_larger_than_candidates_returns_all() {
        let mut result = Sampler::seeded(1).sample(vec![3, 1, 2], 10);
        result.sort();
        assert_eq!(result, vec![1, 2, 3]);
    }

    #[test]
    fn zero_count_and_empty_input() {
        let sampler = Sampler::seeded(1);
        assert!(sampler.sample(vec![1, 2, 3], 0).is_empty());
        assert!(sampler.sample(Vec::<i32>::new(), 5).is_empty());
    }

    #[test]
    fn every_candidate_is_reachable() {
        let sampler = Sampler::seeded(42);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            seen.extend(sampler.sample(vec!['a', 'b', 'c', 'd', 'e'], 1));
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn first_position_is_roughly_uniform() {
        let sampler = Sampler::seeded(99);
        let mut hits = [0usize; 4];
        for _ in 0..4000 {
            let pick = sampler.sample(vec![0usize, 1, 2, 3], 1)[0];
            hits[pick] += 1;
        }
        for count in hits {
            assert!((800..1200).contains(&count), "skewed distribution: {hits:?}");
        }
    }

    proptest! {
        #[test]
        fn sample_is_duplicate_free_subset(
            items in proptest::collection::hash_set(0u32..1000, 0..50),
            count in 0usize..60,
            seed in any::<u64>(),
        ) {
            let candidates: Vec<u32> = items.iter().copied().collect();
            let result = Sampler::seeded(seed).sample(candidates.clone(), count);

            prop_assert_eq!(result.len(), count.min(candidates.len()));
            let unique: HashSet<u32> = result.iter().copied().collect();
            prop_assert_eq!(unique.len(), result.len());
            prop_assert!(unique.is_subset(&items));
        }
    }
}
