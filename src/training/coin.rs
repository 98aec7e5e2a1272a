//! Weighted coin for feature sampling without replacement.

use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// A biased coin that is deterministic given its seed.
///
/// Flipping with `(wanted, total)` succeeds with probability `wanted/total`.
/// Scanning `n` candidates and flipping with `(remaining_wanted, remaining
/// candidates)` at each step selects exactly `wanted` of them, each subset
/// with equal probability. The tree builder uses this to pick the feature
/// subset considered at every split.
#[derive(Debug, Clone)]
pub struct WeightedCoin {
    rng: Xoshiro256PlusPlus,
}

impl WeightedCoin {
    /// Create a coin from a 64-bit seed.
    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Reinitialize the state of the random engine.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    }

    /// Flip the coin: true with probability `wanted / total`.
    #[inline]
    pub fn flip(&mut self, wanted: u32, total: u32) -> bool {
        debug_assert!(wanted <= total);
        if wanted == 0 {
            return false;
        }
        if wanted >= total {
            return true;
        }
        self.rng.gen_range(0..total) < wanted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Simulate one full sampling scan: returns the selected candidates.
    fn scan(coin: &mut WeightedCoin, wanted: u32, total: u32) -> Vec<u32> {
        let mut remaining = wanted;
        let mut selected = Vec::new();
        for i in 0..total {
            if coin.flip(remaining, total - i) {
                selected.push(i);
                remaining -= 1;
            }
        }
        selected
    }

    #[test]
    fn scan_selects_exactly_wanted() {
        let mut coin = WeightedCoin::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(scan(&mut coin, 3, 10).len(), 3);
        }
        assert_eq!(scan(&mut coin, 0, 10).len(), 0);
        assert_eq!(scan(&mut coin, 10, 10).len(), 10);
    }

    #[test]
    fn scan_is_deterministic_given_seed() {
        let mut a = WeightedCoin::seed_from_u64(42);
        let mut b = WeightedCoin::seed_from_u64(42);
        for _ in 0..50 {
            assert_eq!(scan(&mut a, 4, 12), scan(&mut b, 4, 12));
        }

        a.reseed(42);
        b.reseed(99);
        let runs_a: Vec<_> = (0..20).map(|_| scan(&mut a, 4, 12)).collect();
        let runs_b: Vec<_> = (0..20).map(|_| scan(&mut b, 4, 12)).collect();
        assert_ne!(runs_a, runs_b);
    }

    #[test]
    fn per_position_frequency_converges_to_ratio() {
        let mut coin = WeightedCoin::seed_from_u64(1);
        let (wanted, total, rounds) = (3u32, 9u32, 20_000usize);
        let mut hits = vec![0u32; total as usize];
        for _ in 0..rounds {
            for i in scan(&mut coin, wanted, total) {
                hits[i as usize] += 1;
            }
        }
        let expected = wanted as f64 / total as f64;
        for &h in &hits {
            let freq = h as f64 / rounds as f64;
            assert!(
                (freq - expected).abs() < 0.02,
                "position frequency {freq} too far from {expected}"
            );
        }
    }
}
