//! Match State Definitions
//!
//! The single authoritative aggregate for one match: wall, per-seat
//! hands, discards, melds and revealed bonus tiles, plus turn, dealer and
//! round bookkeeping. Engine functions take it by `&mut` reference.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::{compute_state_hash, StateHash, StateHasher};
use crate::core::rng::DeterministicRng;
use crate::game::claim::{ClaimWindow, PendingRobKong};
use crate::game::events::{Audience, GameEvent, GameEventData};
use crate::game::meld::Meld;
use crate::game::tile::{Seat, Tile, TileCounts, TileId, Wind, SEAT_COUNT, TOTAL_TILES};
use crate::game::timer::TimerSet;
use crate::game::wall::TileWall;
use crate::game::win::WinningCombination;

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier (UUID as bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }
}

// =============================================================================
// PLAYER STATE
// =============================================================================

/// One seat's tiles and flags.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerState {
    /// Seat index.
    pub seat: Seat,
    /// Player at this seat.
    pub id: PlayerId,
    /// Concealed tiles.
    pub hand: Vec<Tile>,
    /// Discards in order. Claimed tiles leave this pile.
    pub discards: Vec<Tile>,
    /// Declared melds.
    pub melds: Vec<Meld>,
    /// Revealed flowers and seasons.
    pub bonus: Vec<Tile>,
    /// Committed to discarding only freshly drawn tiles.
    pub waiting: bool,
    /// Tile drawn this turn, cleared once it leaves the hand or the turn ends.
    pub last_drawn: Option<TileId>,
    /// Ready for the next hand.
    pub ready: bool,
    /// Transport reports the player as connected.
    pub connected: bool,
}

impl PlayerState {
    /// Create an empty seat.
    pub fn new(seat: Seat, id: PlayerId) -> Self {
        Self {
            seat,
            id,
            hand: Vec::new(),
            discards: Vec::new(),
            melds: Vec::new(),
            bonus: Vec::new(),
            waiting: false,
            last_drawn: None,
            ready: false,
            connected: true,
        }
    }

    /// Clear everything a hand accumulates; keeps id and connection.
    pub fn reset_for_hand(&mut self) {
        self.hand.clear();
        self.discards.clear();
        self.melds.clear();
        self.bonus.clear();
        self.waiting = false;
        self.last_drawn = None;
        self.ready = false;
    }

    /// Number of declared melds.
    #[inline]
    pub fn meld_count(&self) -> usize {
        self.melds.len()
    }

    /// Holding the extra tile that must be discarded.
    pub fn must_discard(&self) -> bool {
        self.hand.len() % 3 == 2
    }

    /// Look up a tile in hand.
    pub fn find_tile(&self, id: TileId) -> Option<Tile> {
        self.hand.iter().find(|t| t.id == id).copied()
    }

    /// Remove a tile from hand.
    pub fn remove_tile(&mut self, id: TileId) -> Option<Tile> {
        let pos = self.hand.iter().position(|t| t.id == id)?;
        if self.last_drawn == Some(id) {
            self.last_drawn = None;
        }
        Some(self.hand.remove(pos))
    }

    /// Remove several tiles, all or nothing.
    pub fn take_tiles(&mut self, ids: &[TileId]) -> Option<Vec<Tile>> {
        if !ids.iter().all(|id| self.hand.iter().any(|t| t.id == *id)) {
            return None;
        }
        ids.iter().map(|id| self.remove_tile(*id)).collect()
    }

    /// Hand with `id` left out, as counts.
    pub fn counts_without(&self, id: TileId) -> TileCounts {
        TileCounts::from_kinds(self.hand.iter().filter(|t| t.id != id).map(|t| t.kind))
    }

    /// Every tile this seat holds anywhere.
    pub fn all_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.hand
            .iter()
            .chain(self.discards.iter())
            .chain(self.melds.iter().flat_map(|m| m.tiles.iter()))
            .chain(self.bonus.iter())
    }

    /// Hash seat contents into the state hasher.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_bytes(&self.id.0);
        hasher.update_tile_ids(self.hand.iter().map(|t| t.id.0));
        hasher.update_tile_ids(self.discards.iter().map(|t| t.id.0));
        hasher.update_u32(self.melds.len() as u32);
        for meld in &self.melds {
            hasher.update_tile_ids(meld.tile_ids().map(|id| id.0));
        }
        hasher.update_tile_ids(self.bonus.iter().map(|t| t.id.0));
        hasher.update_bool(self.waiting);
    }
}

// =============================================================================
// MATCH PHASE
// =============================================================================

/// Phase of the current hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum MatchPhase {
    /// Stripping and replacing flowers and seasons after the deal.
    #[default]
    BonusReplacement,
    /// Normal play.
    DrawDiscard,
    /// Hand over; waiting for ready signals.
    Ended,
}

// =============================================================================
// HAND OUTCOME
// =============================================================================

/// One winner of a hand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerEntry {
    /// Winning seat.
    pub seat: Seat,
    /// Decomposition claimed.
    pub combination: WinningCombination,
    /// Completing tile. For discard and robbed-kong wins it stays where it was.
    pub winning_tile: Tile,
}

/// How a hand ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HandOutcome {
    /// Current player completed the hand from their own tiles.
    SelfDrawn {
        /// Winner.
        winner: WinnerEntry,
    },
    /// One player won off a discard.
    Discard {
        /// Winner.
        winner: WinnerEntry,
        /// Seat that discarded.
        discarder: Seat,
    },
    /// Several players won off the same discard.
    MultiWinner {
        /// Winners, closest to the discarder first.
        winners: Vec<WinnerEntry>,
        /// Seat that discarded.
        discarder: Seat,
    },
    /// One or more players won off an extended kong's tile.
    RobbedKong {
        /// Winners, closest to the declarer first.
        winners: Vec<WinnerEntry>,
        /// Seat that extended the kong; the losing party.
        declarer: Seat,
    },
    /// Wall ran out.
    Exhausted,
}

impl HandOutcome {
    /// Winning seats.
    pub fn winners(&self) -> Vec<Seat> {
        match self {
            HandOutcome::SelfDrawn { winner } | HandOutcome::Discard { winner, .. } => vec![winner.seat],
            HandOutcome::MultiWinner { winners, .. } | HandOutcome::RobbedKong { winners, .. } => {
                winners.iter().map(|w| w.seat).collect()
            }
            HandOutcome::Exhausted => Vec::new(),
        }
    }

    /// Seat that gave up the winning tile.
    pub fn loser(&self) -> Option<Seat> {
        match self {
            HandOutcome::Discard { discarder, .. } | HandOutcome::MultiWinner { discarder, .. } => Some(*discarder),
            HandOutcome::RobbedKong { declarer, .. } => Some(*declarer),
            HandOutcome::SelfDrawn { .. } | HandOutcome::Exhausted => None,
        }
    }

    /// The dealer keeps the seat after winning, however the winning tile
    /// arrived, or after a drawn-out wall.
    pub fn retains_dealer(&self, dealer: Seat) -> bool {
        match self {
            HandOutcome::Exhausted => true,
            _ => self.winners().contains(&dealer),
        }
    }
}

/// Tile accounting failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConservationError {
    /// Locations do not add up to the full population.
    #[error("tile count {found}, expected {expected}")]
    Count {
        /// Tiles found.
        found: usize,
        /// Full population.
        expected: usize,
    },
    /// A tile sits in two places.
    #[error("tile {0:?} found in two locations")]
    Duplicate(TileId),
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Complete state of a match.
#[derive(Clone, Debug)]
pub struct MatchState {
    /// Match identifier
    pub match_id: [u8; 16],

    /// Seed of the current hand's shuffle (for verification)
    pub rng_seed: u64,

    /// Deterministic RNG state
    pub rng: DeterministicRng,

    /// Draw wall
    pub wall: TileWall,

    /// Seats 0..4
    pub players: Vec<PlayerState>,

    /// Turn owner
    pub current: Seat,

    /// Dealer of the current hand
    pub dealer: Seat,

    /// Phase of the current hand
    pub phase: MatchPhase,

    /// Round counter, advanced when the dealer seat cycles back to 0
    pub round: u32,

    /// Prevailing wind
    pub wind: Wind,

    /// Hands played in this match, starting at 0
    pub hand_number: u32,

    /// Open discard claim window
    pub claim_window: Option<ClaimWindow>,

    /// Open rob-the-kong window
    pub rob_kong: Option<PendingRobKong>,

    /// Live timers
    pub timers: TimerSet,

    /// Outcome of the last finished hand
    pub outcome: Option<HandOutcome>,

    /// Wind cycle complete; no further hands
    pub match_over: bool,

    /// Events generated since the last drain
    pub pending_events: Vec<GameEvent>,
}

impl MatchState {
    /// Create a match with four seated players.
    pub fn new(match_id: [u8; 16], player_ids: [PlayerId; SEAT_COUNT], rng_seed: u64) -> Self {
        Self {
            match_id,
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
            wall: TileWall::new(),
            players: player_ids
                .iter()
                .enumerate()
                .map(|(seat, id)| PlayerState::new(seat, *id))
                .collect(),
            current: 0,
            dealer: 0,
            phase: MatchPhase::BonusReplacement,
            round: 0,
            wind: Wind::East,
            hand_number: 0,
            claim_window: None,
            rob_kong: None,
            timers: TimerSet::new(),
            outcome: None,
            match_over: false,
            pending_events: Vec::new(),
        }
    }

    /// Player at `seat`.
    pub fn player(&self, seat: Seat) -> &PlayerState {
        &self.players[seat % SEAT_COUNT]
    }

    /// Player at `seat`, mutably.
    pub fn player_mut(&mut self, seat: Seat) -> &mut PlayerState {
        &mut self.players[seat % SEAT_COUNT]
    }

    /// Seat of a player id.
    pub fn seat_of(&self, id: &PlayerId) -> Option<Seat> {
        self.players.iter().position(|p| p.id == *id)
    }

    /// Raw 16-byte ids in seat order.
    pub fn player_id_bytes(&self) -> Vec<[u8; 16]> {
        self.players.iter().map(|p| p.id.0).collect()
    }

    /// Check whether a claim or rob-the-kong window is open.
    pub fn window_open(&self) -> bool {
        self.claim_window.is_some() || self.rob_kong.is_some()
    }

    /// Check if the hand has ended.
    pub fn is_ended(&self) -> bool {
        matches!(self.phase, MatchPhase::Ended)
    }

    /// Verify that every tile is in exactly one place.
    pub fn check_conservation(&self) -> Result<(), ConservationError> {
        let mut seen = [false; TOTAL_TILES];
        let mut found = 0usize;

        let tiles = self.wall.iter().chain(self.players.iter().flat_map(|p| p.all_tiles()));
        for tile in tiles {
            found += 1;
            let slot = seen
                .get_mut(tile.id.0 as usize)
                .ok_or(ConservationError::Duplicate(tile.id))?;
            if *slot {
                return Err(ConservationError::Duplicate(tile.id));
            }
            *slot = true;
        }

        if found != TOTAL_TILES {
            return Err(ConservationError::Count { found, expected: TOTAL_TILES });
        }
        Ok(())
    }

    /// Compute hash of the tile layout for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.hand_number, self.rng_seed, |hasher| {
            hasher.update_tile_ids(self.wall.iter().map(|t| t.id.0));
            for player in &self.players {
                player.hash_into(hasher);
            }
            hasher.update_u8(self.current as u8);
            hasher.update_u8(self.dealer as u8);
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    /// Push an event for everyone.
    pub fn broadcast(&mut self, data: GameEventData) {
        self.push_event(GameEvent::new(Audience::All, self.hand_number, data));
    }

    /// Push an event for one seat only.
    pub fn send_to(&mut self, seat: Seat, data: GameEventData) {
        self.push_event(GameEvent::new(Audience::Seat(seat), self.hand_number, data));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> [PlayerId; SEAT_COUNT] {
        [0u8, 1, 2, 3].map(|i| PlayerId::new([i; 16]))
    }

    #[test]
    fn test_player_id_uuid_string() {
        let id = PlayerId::new([0xab; 16]);
        assert_eq!(id.to_uuid_string(), "abababab-abab-abab-abab-abababababab");
    }

    #[test]
    fn test_fresh_state_conserves_tiles() {
        let state = MatchState::new([0; 16], ids(), 1);
        assert_eq!(state.check_conservation(), Ok(()));
    }

    #[test]
    fn test_conservation_detects_loss_and_duplication() {
        let mut state = MatchState::new([0; 16], ids(), 1);
        let tile = state.wall.draw().unwrap();
        assert!(matches!(state.check_conservation(), Err(ConservationError::Count { found: 143, .. })));

        state.player_mut(0).hand.push(tile);
        state.player_mut(1).discards.push(tile);
        assert_eq!(state.check_conservation(), Err(ConservationError::Duplicate(tile.id)));
    }

    #[test]
    fn test_take_tiles_all_or_nothing() {
        let mut state = MatchState::new([0; 16], ids(), 1);
        let a = state.wall.draw().unwrap();
        let b = state.wall.draw().unwrap();
        let player = state.player_mut(2);
        player.hand = vec![a, b];

        assert!(player.take_tiles(&[a.id, TileId(200)]).is_none());
        assert_eq!(player.hand.len(), 2);
        assert_eq!(player.take_tiles(&[b.id, a.id]), Some(vec![b, a]));
        assert!(player.hand.is_empty());
    }

    #[test]
    fn test_hash_tracks_tile_moves() {
        let mut state = MatchState::new([0; 16], ids(), 1);
        let before = state.compute_hash();

        let tile = state.wall.draw().unwrap();
        state.player_mut(0).hand.push(tile);
        let in_hand = state.compute_hash();
        assert_ne!(before, in_hand);

        let tile = state.player_mut(0).remove_tile(tile.id).unwrap();
        state.player_mut(0).discards.push(tile);
        assert_ne!(in_hand, state.compute_hash());
    }

    #[test]
    fn test_outcome_dealer_retention() {
        for dealer in 0..SEAT_COUNT {
            assert!(HandOutcome::Exhausted.retains_dealer(dealer));
        }
        assert_eq!(HandOutcome::Exhausted.winners(), Vec::<Seat>::new());
        assert_eq!(HandOutcome::Exhausted.loser(), None);
    }
}
