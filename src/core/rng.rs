//! Deterministic Random Number Generator
//!
//! Uses Xorshift128+ for the wall shuffle.
//! Given the same seed, every hand is dealt identically on all platforms,
//! which is what makes hand replays and debug deals reproducible.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Deterministic PRNG using Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use mahjong_table::core::rng::DeterministicRng;
///
/// let mut a = DeterministicRng::new(12345);
/// let mut b = DeterministicRng::new(12345);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Xorshift must never hold an all-zero state
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random integer in range [0, max).
    ///
    /// Rejects the biased tail so every value is equally likely, which the
    /// Fisher-Yates shuffle needs for a uniform permutation.
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        let max = max as u64;
        let zone = u64::MAX - (u64::MAX % max);
        loop {
            let value = self.next_u64();
            if value < zone {
                return (value % max) as u32;
            }
        }
    }

    /// Shuffle a slice in place using Fisher-Yates algorithm.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        let len = slice.len();
        for i in (1..len).rev() {
            let j = self.next_int((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive the seed for one hand of a match.
///
/// - `match_id`: unique match identifier
/// - `player_ids`: seat-ordered player ids
/// - `hand_number`: hands already played in this match
///
/// Every hand of a match gets a distinct, reproducible shuffle.
pub fn derive_match_seed(
    match_id: &[u8; 16],
    player_ids: &[[u8; 16]],
    hand_number: u32,
) -> u64 {
    let mut hasher = Sha256::new();

    hasher.update(b"MAHJONG_TABLE_SEED_V1");
    hasher.update(match_id);
    for pid in player_ids {
        hasher.update(pid);
    }
    hasher.update(hand_number.to_le_bytes());

    let hash = hasher.finalize();
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[0..8]);
    u64::from_le_bytes(seed)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_determinism() {
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(12345);

        for _ in 0..1000 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_rng_different_seeds() {
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(54321);

        assert_ne!(rng1.next_u64(), rng2.next_u64());
    }

    #[test]
    fn test_next_int_bounds() {
        let mut rng = DeterministicRng::new(7);
        for max in [1u32, 2, 3, 17, 144] {
            for _ in 0..200 {
                assert!(rng.next_int(max) < max);
            }
        }
        assert_eq!(rng.next_int(0), 0);
    }

    #[test]
    fn test_shuffle_determinism() {
        let mut a: Vec<u32> = (0..144).collect();
        let mut b = a.clone();

        DeterministicRng::new(99).shuffle(&mut a);
        DeterministicRng::new(99).shuffle(&mut b);

        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..144).collect::<Vec<_>>());
    }

    #[test]
    fn test_derive_match_seed() {
        let match_id = [3u8; 16];
        let players = [[1u8; 16], [2u8; 16], [3u8; 16], [4u8; 16]];

        let first = derive_match_seed(&match_id, &players, 0);
        assert_eq!(first, derive_match_seed(&match_id, &players, 0));
        assert_ne!(first, derive_match_seed(&match_id, &players, 1));
    }
}
