//! State Hashing for Verification
//!
//! Provides deterministic hashing of the tile layout for:
//! - Comparing a replayed hand against the live one
//! - Reporting a fingerprint with every hand result

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for match state.
///
/// Wraps SHA-256. Order of updates is significant.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for match state.
    pub fn for_match_state() -> Self {
        Self::new(b"MAHJONG_TABLE_STATE_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a length-prefixed run of tile ids.
    ///
    /// The prefix keeps `[1,2] + [3]` distinct from `[1] + [2,3]`.
    pub fn update_tile_ids(&mut self, ids: impl ExactSizeIterator<Item = u8>) {
        self.update_u32(ids.len() as u32);
        for id in ids {
            self.update_u8(id);
        }
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute state hash for match verification.
///
/// Called by `MatchState::compute_hash()`; the closure adds the
/// location of every tile.
pub fn compute_state_hash<F>(hand_number: u32, rng_seed: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_match_state();

    hasher.update_u32(hand_number);
    hasher.update_u64(rng_seed);

    add_state(&mut hasher);

    hasher.finalize()
}
