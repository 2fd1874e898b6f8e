//! Game Events
//!
//! Everything the engine tells the outside world. Each event names its
//! audience: private hand contents and claim options go to one seat,
//! everything else to the whole table.

use serde::{Serialize, Deserialize};

use crate::game::claim::ClaimOption;
use crate::game::handlers::ErrorCode;
use crate::game::kong::KongOption;
use crate::game::meld::{Meld, MeldKind, MeldView};
use crate::game::state::{HandOutcome, MatchPhase};
use crate::game::tile::{Seat, Tile, Wind};
use crate::game::win::WinningCombination;

/// Who receives an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    /// Every seat.
    All,
    /// One seat only.
    Seat(Seat),
}

impl Audience {
    /// Check whether `seat` receives events for this audience.
    pub fn includes(&self, seat: Seat) -> bool {
        match self {
            Audience::All => true,
            Audience::Seat(s) => *s == seat,
        }
    }
}

/// A seat's tiles revealed at hand end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedHand {
    /// Seat.
    pub seat: Seat,
    /// Concealed tiles.
    pub hand: Vec<Tile>,
    /// Melds, concealed kongs included.
    pub melds: Vec<Meld>,
    /// Bonus tiles.
    pub bonus: Vec<Tile>,
    /// Declared waiting during the hand.
    pub waiting: bool,
}

/// Per-seat result flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatResult {
    /// Seat.
    pub seat: Seat,
    /// Won the hand.
    pub won: bool,
    /// Gave up the winning tile.
    pub dealt_in: bool,
    /// Score change; scoring is not modelled and this is always zero.
    pub score: i32,
}

/// Everything broadcast when a hand ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandResult {
    /// Hand that ended.
    pub hand_number: u32,
    /// How it ended.
    pub outcome: HandOutcome,
    /// All hands face up.
    pub revealed: Vec<RevealedHand>,
    /// Flags per seat.
    pub seats: Vec<SeatResult>,
    /// Dealer keeps the seat.
    pub dealer_retained: bool,
    /// Dealer of the next hand.
    pub next_dealer: Seat,
    /// Round of the next hand.
    pub next_round: u32,
    /// Prevailing wind of the next hand.
    pub next_wind: Wind,
    /// No further hands will be played.
    pub match_over: bool,
    /// Hex SHA-256 of the final tile layout.
    pub state_hash: String,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEventData {
    /// A new hand was dealt.
    HandStarted {
        dealer: Seat,
        round: u32,
        wind: Wind,
        wall_remaining: usize,
    },

    /// Hand phase changed.
    PhaseChanged { phase: MatchPhase },

    /// Private: full concealed hand after any change.
    HandUpdated { hand: Vec<Tile> },

    /// Private: the tile just drawn.
    TileDrawn { tile: Tile },

    /// Public: a seat drew; the tile stays hidden.
    DrawNotice {
        seat: Seat,
        hand_size: usize,
        wall_remaining: usize,
    },

    /// Bonus tiles laid face up.
    BonusRevealed { seat: Seat, tiles: Vec<Tile> },

    /// Turn passed to a seat.
    TurnChanged { seat: Seat },

    /// Private: self-win and self-kong options for the turn owner.
    SelfOptions {
        wins: Vec<WinningCombination>,
        kongs: Vec<KongOption>,
    },

    /// A tile was discarded.
    TileDiscarded {
        seat: Seat,
        tile: Tile,
        /// Discarded by the turn timer.
        automatic: bool,
    },

    /// Claim window opened on a discard.
    ClaimWindowOpened {
        discarder: Seat,
        tile: Tile,
        timeout_ms: u64,
    },

    /// Private: claims available to one seat.
    ClaimOptions { options: Vec<ClaimOption> },

    /// Claim window closed.
    ClaimWindowClosed { claimed: bool },

    /// A discard was claimed into a meld.
    ClaimExecuted {
        seat: Seat,
        from: Seat,
        kind: MeldKind,
        meld: MeldView,
    },

    /// A kong declared from own tiles.
    KongDeclared { seat: Seat, meld: MeldView },

    /// Seat committed to waiting.
    WaitingDeclared { seat: Seat, tile: Tile },

    /// Opponents may win off an extended kong's tile.
    RobKongWindowOpened {
        declarer: Seat,
        tile: Tile,
        timeout_ms: u64,
    },

    /// Hand over.
    HandEnded(Box<HandResult>),

    /// Seat ready for the next hand.
    PlayerReady { seat: Seat },

    /// Seat connection changed.
    ConnectionChanged { seat: Seat, connected: bool },

    /// Everyone ready; the next hand is being dealt.
    NextHandStarting { hand_number: u32 },

    /// The wind cycle is complete.
    MatchOver { hands_played: u32 },

    /// Private: an intent was refused and nothing changed.
    ActionRejected { code: ErrorCode, message: String },
}

/// An event with its audience.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Recipients.
    pub audience: Audience,

    /// Hand the event belongs to.
    pub hand_number: u32,

    /// Event data.
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(audience: Audience, hand_number: u32, data: GameEventData) -> Self {
        Self {
            audience,
            hand_number,
            data,
        }
    }

    /// Private to one seat.
    pub fn is_private(&self) -> bool {
        matches!(self.audience, Audience::Seat(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audience_filter() {
        assert!(Audience::All.includes(3));
        assert!(Audience::Seat(2).includes(2));
        assert!(!Audience::Seat(2).includes(1));
    }

    #[test]
    fn test_event_json_tagging() {
        let event = GameEvent::new(Audience::All, 4, GameEventData::TurnChanged { seat: 1 });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"turn_changed\""));

        let parsed: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
        assert!(!parsed.is_private());
    }
}
