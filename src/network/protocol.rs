//! Protocol Messages
//!
//! Wire format between table clients and a match session.
//! Every message is JSON; the flat [`TableSummary`] snapshot also has a
//! bincode form for compact resyncs.

use serde::{Serialize, Deserialize};

use crate::game::events::GameEvent;
use crate::game::intent::PlayerIntent;
use crate::game::meld::MeldView;
use crate::game::state::{MatchPhase, MatchState};
use crate::game::tile::{Seat, Tile, Wind};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from a seated client to its session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A game action.
    Intent(PlayerIntent),

    /// Request a snapshot of the table (for reconnection).
    SyncRequest,

    /// Ping for latency measurement.
    Ping { timestamp: u64 },

    /// Player is leaving the table.
    Leave,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from a session to one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Engine event addressed to this client.
    Event(GameEvent),

    /// Table snapshot.
    Sync(TableSummary),

    /// Pong response.
    Pong { timestamp: u64, server_time: u64 },

    /// Transport-level error. Rule violations arrive as events instead.
    Error(ServerError),

    /// Session is shutting down.
    Shutdown { reason: String },
}

/// Transport-level error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ServerErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Transport error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerErrorCode {
    /// Message did not decode.
    InvalidMessage,
    /// Sender has left the table.
    NotSeated,
}

// =============================================================================
// TABLE SNAPSHOT
// =============================================================================

/// Public view of one seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSummary {
    /// Seat index.
    pub seat: Seat,
    /// Player id.
    pub player_id: [u8; 16],
    /// Concealed tiles held (count only).
    pub hand_size: usize,
    /// Discard pile.
    pub discards: Vec<Tile>,
    /// Melds as opponents see them.
    pub melds: Vec<MeldView>,
    /// Revealed bonus tiles.
    pub bonus: Vec<Tile>,
    /// Declared waiting.
    pub waiting: bool,
    /// Ready for the next hand.
    pub ready: bool,
    /// Connected.
    pub connected: bool,
}

/// Everything a reconnecting client needs to redraw the table.
///
/// Only the requesting seat's concealed hand is included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    /// Match identifier.
    pub match_id: [u8; 16],
    /// Hand number.
    pub hand_number: u32,
    /// Phase.
    pub phase: MatchPhase,
    /// Dealer seat.
    pub dealer: Seat,
    /// Turn owner.
    pub current: Seat,
    /// Round counter.
    pub round: u32,
    /// Prevailing wind.
    pub wind: Wind,
    /// Tiles left to draw.
    pub wall_remaining: usize,
    /// A claim or rob-the-kong window is open.
    pub window_open: bool,
    /// No further hands.
    pub match_over: bool,
    /// Seat the snapshot was built for.
    pub viewer: Seat,
    /// Viewer's concealed hand.
    pub hand: Vec<Tile>,
    /// All seats, public view.
    pub seats: Vec<SeatSummary>,
}

impl TableSummary {
    /// Build the snapshot `viewer` is allowed to see.
    pub fn for_seat(state: &MatchState, viewer: Seat) -> Self {
        Self {
            match_id: state.match_id,
            hand_number: state.hand_number,
            phase: state.phase,
            dealer: state.dealer,
            current: state.current,
            round: state.round,
            wind: state.wind,
            wall_remaining: state.wall.remaining(),
            window_open: state.window_open(),
            match_over: state.match_over,
            viewer,
            hand: state.player(viewer).hand.clone(),
            seats: state
                .players
                .iter()
                .map(|p| SeatSummary {
                    seat: p.seat,
                    player_id: p.id.0,
                    hand_size: p.hand.len(),
                    discards: p.discards.clone(),
                    melds: p.melds.iter().map(|m| m.public_view()).collect(),
                    bonus: p.bonus.clone(),
                    waiting: p.waiting,
                    ready: p.ready,
                    connected: p.connected,
                })
                .collect(),
        }
    }

    /// Serialize to binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Transport error reply.
    pub fn error(code: ServerErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error(ServerError { code, message: message.into() })
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::engine::{start_hand, TableConfig};
    use crate::game::events::{Audience, GameEventData};
    use crate::game::state::PlayerId;
    use crate::game::tile::TileId;

    fn started() -> MatchState {
        let ids = [1u8, 2, 3, 4].map(|i| PlayerId::new([i; 16]));
        let mut state = MatchState::new([6; 16], ids, 99);
        start_hand(&mut state, &TableConfig::default());
        state
    }

    #[test]
    fn test_client_intent_json() {
        let msg = ClientMessage::from_json(r#"{"type":"intent","intent":"discard","tile":42}"#).unwrap();
        assert_eq!(msg, ClientMessage::Intent(PlayerIntent::Discard { tile: TileId(42) }));

        let ready = ClientMessage::Intent(PlayerIntent::Ready);
        let json = ready.to_json().unwrap();
        assert_eq!(ClientMessage::from_json(&json).unwrap(), ready);
    }

    #[test]
    fn test_client_control_messages() {
        let ping = ClientMessage::from_json(r#"{"type":"ping","timestamp":12}"#).unwrap();
        assert_eq!(ping, ClientMessage::Ping { timestamp: 12 });
        assert_eq!(ClientMessage::from_json(r#"{"type":"sync_request"}"#).unwrap(), ClientMessage::SyncRequest);
        assert!(ClientMessage::from_json(r#"{"type":"intent","intent":"shuffle"}"#).is_err());
    }

    #[test]
    fn test_server_event_json_roundtrip() {
        let msg = ServerMessage::Event(GameEvent::new(
            Audience::Seat(1),
            0,
            GameEventData::PlayerReady { seat: 1 },
        ));
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"event\""));
        assert!(json.contains("\"event\":\"player_ready\""));
        assert_eq!(ServerMessage::from_json(&json).unwrap(), msg);
    }

    #[test]
    fn test_server_error_codes() {
        let msg = ServerMessage::error(ServerErrorCode::NotSeated, "no seat");
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"code\":\"not_seated\""));
        assert_eq!(ServerMessage::from_json(&json).unwrap(), msg);
    }

    #[test]
    fn test_summary_hides_other_hands() {
        let state = started();
        let summary = TableSummary::for_seat(&state, 2);

        assert_eq!(summary.hand, state.player(2).hand);
        assert_eq!(summary.seats.len(), 4);
        assert_eq!(summary.seats[0].hand_size, 17);
        assert_eq!(summary.wall_remaining, state.wall.remaining());
        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(json.matches("\"hand\":").count(), 1);
    }

    #[test]
    fn test_summary_binary_roundtrip() {
        // Tagged enums do not survive bincode; the summary is a flat struct.
        let summary = TableSummary::for_seat(&started(), 0);
        let bytes = summary.to_bytes().unwrap();
        assert_eq!(TableSummary::from_bytes(&bytes).unwrap(), summary);
    }
}
