//! Seedable Xorshift64 generator used for particle spawning.
//!
//! Random positions and ages only need to be cheap and reproducible, so the
//! pool of an advector built twice from the same seed is bit-identical.

use serde::{Deserialize, Serialize};

/// Xorshift64 PRNG with shifts (13, 7, 17).
///
/// A seed of 0 is replaced by a fixed non-zero seed, since zero is a fixed
/// point of the algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const FALLBACK_SEED: u64 = 0x5EED_DEAD_BEEF_CAFE;

    /// Seeded generator; a zero seed falls back to a fixed non-zero one.
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { Self::FALLBACK_SEED } else { seed },
        }
    }

    /// Next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform index in `[0, len)`, e.g. a grid column.
    ///
    /// # Panics
    ///
    /// Panics if `len` is 0.
    pub fn next_usize(&mut self, len: usize) -> usize {
        (self.next_u64() % len as u64) as usize
    }

    /// Uniform `u32` in `[0, bound)`, used for particle ages.
    ///
    /// # Panics
    ///
    /// Panics if `bound` is 0.
    pub fn next_below(&mut self, bound: u32) -> u32 {
        (self.next_u64() % u64::from(bound)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_value_for_seed_42_is_stable() {
        // Changing this invalidates every recorded particle pool.
        let mut rng = Xorshift64::new(42);
        assert_eq!(rng.next_u64(), 45_454_805_674);
    }

    #[test]
    fn seed_zero_is_replaced() {
        let mut rng = Xorshift64::new(0);
        assert_ne!(rng.next_u64(), 0);
        assert_ne!(rng.next_u64(), 0);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Xorshift64::new(2024);
        let mut b = Xorshift64::new(2024);
        for i in 0..500 {
            assert_eq!(a.next_usize(360), b.next_usize(360), "diverged at {i}");
        }
    }

    #[test]
    fn next_usize_covers_every_column_of_a_small_grid() {
        let mut rng = Xorshift64::new(7);
        let mut seen = [false; 12];
        for _ in 0..1_000 {
            seen[rng.next_usize(12)] = true;
        }
        assert!(seen.iter().all(|&s| s), "columns never drawn: {seen:?}");
    }

    #[test]
    fn state_survives_serialization() {
        let mut rng = Xorshift64::new(99);
        for _ in 0..10 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: Xorshift64 = serde_json::from_str(&json).unwrap();
        for _ in 0..50 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn next_usize_is_below_len(seed: u64, len in 1_usize..100_000) {
                let mut rng = Xorshift64::new(seed);
                for _ in 0..100 {
                    prop_assert!(rng.next_usize(len) < len);
                }
            }

            #[test]
            fn next_below_is_below_bound(seed: u64, bound in 1_u32..10_000) {
                let mut rng = Xorshift64::new(seed);
                for _ in 0..100 {
                    prop_assert!(rng.next_below(bound) < bound);
                }
            }
        }
    }
}
