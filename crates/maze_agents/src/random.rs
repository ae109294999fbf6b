//! Randomness used for exploration, tie-breaking and endpoint sampling.

use rand::Rng;

/// Source of uniform random numbers.
///
/// Every [`rand::Rng`] is a `RandomSource`, so tests can pass a seeded
/// `StdRng` for deterministic runs.
pub trait RandomSource {
    /// Uniform float in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Uniform integer in `0..upper`. `upper` must be non-zero.
    fn below(&mut self, upper: usize) -> usize;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn unit(&mut self) -> f64 {
        self.random::<f64>()
    }

    fn below(&mut self, upper: usize) -> usize {
        self.random_range(0..upper)
    }
}

/// Picks a uniformly random element of `items`, or `None` if it is empty.
pub(crate) fn pick<T: Copy, R: RandomSource + ?Sized>(rng: &mut R, items: &[T]) -> Option<T> {
    if items.is_empty() {
        None
    } else {
        Some(items[rng.below(items.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_unit_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let v = rng.unit();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_below_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            assert!(rng.below(4) < 4);
        }
    }

    #[test]
    fn test_pick() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(pick::<u8, _>(&mut rng, &[]), None);
        assert_eq!(pick(&mut rng, &[9]), Some(9));
    }
}
