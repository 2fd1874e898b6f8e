//! Core deterministic primitives.
//!
//! Seeded randomness and state hashing shared by the rules engine.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash, StateHasher};
