//! Per-party randomness.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bits::{Basis, Bit};

/// Uniform bit and basis draws for one party in one session.
///
/// Wraps any [`Rng`]; sessions that need reproducibility use
/// [`RandomSource::seeded`].
#[derive(Debug, Clone)]
pub struct RandomSource<R = StdRng> {
    rng: R,
}

impl RandomSource<StdRng> {
    /// Deterministic source for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Source seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> RandomSource<R> {
    /// Wrap a caller-supplied generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// `n` independent uniform bits.
    pub fn draw_bits(&mut self, n: usize) -> Vec<Bit> {
        (0..n).map(|_| Bit::from(self.rng.r#gen::<bool>())).collect()
    }

    /// `n` independent uniform bases.
    pub fn draw_bases(&mut self, n: usize) -> Vec<Basis> {
        (0..n).map(|_| Basis::from(self.rng.r#gen::<bool>())).collect()
    }

    /// Draw a seed for a derived generator.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }

    /// Derive an independent seeded source, e.g. for another party.
    pub fn fork(&mut self) -> RandomSource<StdRng> {
        RandomSource::seeded(self.next_seed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lengths() {
        let mut source = RandomSource::seeded(1);
        assert_eq!(source.draw_bits(20).len(), 20);
        assert_eq!(source.draw_bases(127).len(), 127);
        assert!(source.draw_bits(0).is_empty());
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = RandomSource::seeded(42);
        let mut b = RandomSource::seeded(42);
        assert_eq!(a.draw_bits(64), b.draw_bits(64));
        assert_eq!(a.draw_bases(64), b.draw_bases(64));
    }

    #[test]
    fn test_draws_are_roughly_uniform() {
        let mut source = RandomSource::seeded(7);
        let n = 10_000;
        let ones = source.draw_bits(n).into_iter().filter(|b| *b == Bit::One).count();
        let xs = source.draw_bases(n).into_iter().filter(|b| *b == Basis::X).count();
        assert!((ones as f64 / n as f64 - 0.5).abs() < 0.03);
        assert!((xs as f64 / n as f64 - 0.5).abs() < 0.03);
    }

    #[test]
    fn test_forks_differ() {
        let mut root = RandomSource::seeded(3);
        let mut a = root.fork();
        let mut b = root.fork();
        assert_ne!(a.draw_bits(64), b.draw_bits(64));
    }
}
