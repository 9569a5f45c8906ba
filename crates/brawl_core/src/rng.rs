//! Seeded pseudo-random numbers for targeting rolls and roster generation.
//!
//! The battle resolver never touches system randomness. Every random
//! choice (a spider picking a target, the shop rolling offers, the
//! opponent generator) draws from a [`BattleRng`] seeded by the caller,
//! so the same seed always replays the same battle.

use serde::{Deserialize, Serialize};

/// Small linear congruential generator.
///
/// Not suitable for anything security related. It only needs to be
/// cheap, portable and bit-for-bit reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRng {
    state: u64,
}

impl BattleRng {
    /// Create a generator from a seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Next raw value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(0x5851_F42D_4C95_7F2D)
            .wrapping_add(0x1405_7B7E_F767_814F);
        // High bits of an LCG are far better distributed than the low ones.
        self.state >> 17
    }

    /// Uniform index in `0..len`. Returns 0 when `len` is 0.
    pub fn next_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_u64() % len as u64) as usize
    }

    /// Uniform value in `min..max` (half-open). Returns `min` for an empty range.
    pub fn next_range(&mut self, min: i32, max: i32) -> i32 {
        let range = i64::from(max) - i64::from(min);
        if range <= 0 {
            return min;
        }
        min + (self.next_u64() % range as u64) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = BattleRng::new(42);
        let mut b = BattleRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = BattleRng::new(1);
        let mut b = BattleRng::new(2);
        let same = (0..16).filter(|_| a.next_u64() == b.next_u64()).count();
        assert!(same < 16);
    }

    #[test]
    fn next_index_stays_in_bounds() {
        let mut rng = BattleRng::new(7);
        for len in 1..20 {
            for _ in 0..50 {
                assert!(rng.next_index(len) < len);
            }
        }
        assert_eq!(rng.next_index(0), 0);
    }

    #[test]
    fn next_range_handles_empty_range() {
        let mut rng = BattleRng::new(7);
        assert_eq!(rng.next_range(5, 5), 5);
        assert_eq!(rng.next_range(5, 3), 5);
        for _ in 0..100 {
            let v = rng.next_range(-3, 4);
            assert!((-3..4).contains(&v));
        }
    }
}
