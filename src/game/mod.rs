//! Game Logic Module
//!
//! The rules engine. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `tile`: Tile kinds, ids, count maps
//! - `wall`: Shuffled draw wall
//! - `win`: Winning hand search
//! - `meld`: Declared sets
//! - `kong`: Kong options from own tiles
//! - `claim`: Claim windows and priority resolution
//! - `timer`: Timer handles and liveness
//! - `state`: Match state, player state
//! - `events`: Outbound events with audiences
//! - `intent`: Inbound player actions
//! - `engine`: Hand flow and rotation
//! - `handlers`: Intent validation

pub mod tile;
pub mod wall;
pub mod win;
pub mod meld;
pub mod kong;
pub mod claim;
pub mod timer;
pub mod state;
pub mod events;
pub mod intent;
pub mod engine;
pub mod handlers;

// Re-export key types
pub use tile::{Seat, Tile, TileId, TileKind, Suit, Wind};
pub use state::{MatchState, PlayerState, PlayerId, MatchPhase, HandOutcome};
pub use engine::{ActionResult, MatchEngine, TableConfig};
pub use events::{GameEvent, GameEventData};
pub use handlers::{ActionError, ErrorCode};
pub use intent::PlayerIntent;
