//! Network Layer
//!
//! Wire messages and per-table sessions.
//! This layer is **non-deterministic** - all rules run through `game/`.

pub mod protocol;
pub mod session;

pub use protocol::{ClientMessage, ServerMessage, TableSummary};
pub use session::{MatchSession, SessionConfig, SessionError, SessionHandle, SessionId, SessionManager};
