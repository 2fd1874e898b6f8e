//! # Mahjong Table Server
//!
//! Authoritative rules engine for four-player mahjong tables.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   MAHJONG TABLE SERVER                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Rules engine (deterministic)              │
//! │  ├── tile.rs     - Tiles, kinds, count maps                  │
//! │  ├── wall.rs     - Draw wall                                 │
//! │  ├── win.rs      - Winning hand search                       │
//! │  ├── kong.rs     - Self-declared kong options                │
//! │  ├── claim.rs    - Claim windows and priority                │
//! │  ├── timer.rs    - Cancellable timer bookkeeping             │
//! │  ├── state.rs    - Match and player state                    │
//! │  ├── engine.rs   - Hand flow, rotation, configuration        │
//! │  └── handlers.rs - Intent validation and typed errors        │
//! │                                                              │
//! │  network/        - Sessions (non-deterministic)              │
//! │  ├── protocol.rs - Message types                             │
//! │  └── session.rs  - Per-table command loop and tokio timers   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are deterministic:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time; timers are ids the session resolves
//! - All randomness from seeded Xorshift128+
//!
//! Given the same match id, players and inputs, every hand deals and
//! resolves identically, and its reported state hash matches.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use game::engine::{MatchEngine, TableConfig};
pub use game::intent::PlayerIntent;
pub use game::state::{MatchState, PlayerState, PlayerId};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
