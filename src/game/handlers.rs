//! Action Handlers
//!
//! Validate who is acting and whether the action is legal right now, then
//! delegate to the engine. A handler either changes nothing and returns an
//! [`ActionError`], or delegates exactly once.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::claim::ClaimOption;
use crate::game::engine::{self, TableConfig};
use crate::game::intent::PlayerIntent;
use crate::game::state::{MatchPhase, MatchState};
use crate::game::tile::{Seat, TileId, SEAT_COUNT};
use crate::game::win::waiting_kinds;

/// Wire code for a rejected intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Another seat holds the turn.
    WrongTurn,
    /// Not allowed in the current phase.
    WrongPhase,
    /// A claim window suspends the turn.
    WindowOpen,
    /// Hand is not holding a tile to discard.
    InvalidHandSize,
    /// Tile not in the actor's hand.
    TileNotInHand,
    /// No claim window is open.
    ClaimWindowClosed,
    /// Actor has no options in the open window.
    NotEligible,
    /// No registered claim to withdraw.
    NothingToCancel,
    /// Waiting already declared.
    AlreadyWaiting,
    /// Discard would not leave a waiting hand.
    NotWaiting,
    /// Waiting players discard only the drawn tile.
    WaitingDiscardLocked,
    /// Kong option not available.
    InvalidKong,
    /// No self-drawn win with that decomposition.
    NoSelfWin,
    /// Ready already signalled.
    AlreadyReady,
    /// The match has finished.
    MatchOver,
    /// Seat index out of range.
    InvalidSeat,
}

/// Why an intent was refused. No state changes accompany any of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Another seat holds the turn.
    #[error("not your turn (seat {expected} to act)")]
    WrongTurn {
        /// Turn owner.
        expected: Seat,
    },

    /// Not allowed in the current phase.
    #[error("not allowed during {phase:?}")]
    WrongPhase {
        /// Current phase.
        phase: MatchPhase,
    },

    /// A claim window suspends the turn.
    #[error("a claim window is open")]
    WindowOpen,

    /// Hand is not holding a tile to discard.
    #[error("hand of {size} tiles cannot discard")]
    InvalidHandSize {
        /// Concealed tiles held.
        size: usize,
    },

    /// Tile not in the actor's hand.
    #[error("tile {0:?} is not in hand")]
    TileNotInHand(TileId),

    /// No claim window is open.
    #[error("no claim window is open")]
    ClaimWindowClosed,

    /// Actor has no options in the open window.
    #[error("no claim available in this window")]
    NotEligible,

    /// No registered claim to withdraw.
    #[error("no registered claim to cancel")]
    NothingToCancel,

    /// Waiting already declared.
    #[error("already waiting")]
    AlreadyWaiting,

    /// Discard would not leave a waiting hand.
    #[error("hand would not be waiting after that discard")]
    NotWaiting,

    /// Waiting players discard only the drawn tile.
    #[error("waiting: only the drawn tile may be discarded")]
    WaitingDiscardLocked,

    /// Kong option not available.
    #[error("kong option not available")]
    InvalidKong,

    /// No self-drawn win with that decomposition.
    #[error("no self-drawn win with that combination")]
    NoSelfWin,

    /// Ready already signalled.
    #[error("already ready")]
    AlreadyReady,

    /// The match has finished.
    #[error("match is over")]
    MatchOver,

    /// Seat index out of range.
    #[error("no seat {0}")]
    InvalidSeat(Seat),
}

impl ActionError {
    /// Wire code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ActionError::WrongTurn { .. } => ErrorCode::WrongTurn,
            ActionError::WrongPhase { .. } => ErrorCode::WrongPhase,
            ActionError::WindowOpen => ErrorCode::WindowOpen,
            ActionError::InvalidHandSize { .. } => ErrorCode::InvalidHandSize,
            ActionError::TileNotInHand(_) => ErrorCode::TileNotInHand,
            ActionError::ClaimWindowClosed => ErrorCode::ClaimWindowClosed,
            ActionError::NotEligible => ErrorCode::NotEligible,
            ActionError::NothingToCancel => ErrorCode::NothingToCancel,
            ActionError::AlreadyWaiting => ErrorCode::AlreadyWaiting,
            ActionError::NotWaiting => ErrorCode::NotWaiting,
            ActionError::WaitingDiscardLocked => ErrorCode::WaitingDiscardLocked,
            ActionError::InvalidKong => ErrorCode::InvalidKong,
            ActionError::NoSelfWin => ErrorCode::NoSelfWin,
            ActionError::AlreadyReady => ErrorCode::AlreadyReady,
            ActionError::MatchOver => ErrorCode::MatchOver,
            ActionError::InvalidSeat(_) => ErrorCode::InvalidSeat,
        }
    }
}

// =============================================================================
// GUARDS
// =============================================================================

/// The actor owns an unsuspended turn in draw/discard.
fn require_turn(state: &MatchState, seat: Seat) -> Result<(), ActionError> {
    if state.phase != MatchPhase::DrawDiscard {
        return Err(ActionError::WrongPhase { phase: state.phase });
    }
    if state.window_open() {
        return Err(ActionError::WindowOpen);
    }
    if state.current != seat {
        return Err(ActionError::WrongTurn { expected: state.current });
    }
    Ok(())
}

/// The actor holds the extra tile.
fn require_discard_ready(state: &MatchState, seat: Seat) -> Result<(), ActionError> {
    let player = state.player(seat);
    if !player.must_discard() {
        return Err(ActionError::InvalidHandSize { size: player.hand.len() });
    }
    Ok(())
}

/// The actor has options in the open window.
fn require_eligible(state: &MatchState, seat: Seat) -> Result<(), ActionError> {
    if !state.window_open() {
        return Err(ActionError::ClaimWindowClosed);
    }
    engine::window_options(state, seat)
        .map(|_| ())
        .ok_or(ActionError::NotEligible)
}

fn require_tile(state: &MatchState, seat: Seat, tile: TileId) -> Result<(), ActionError> {
    state
        .player(seat)
        .find_tile(tile)
        .map(|_| ())
        .ok_or(ActionError::TileNotInHand(tile))
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Validate and apply one intent from `seat`.
pub fn handle_intent(
    state: &mut MatchState,
    config: &TableConfig,
    seat: Seat,
    intent: &PlayerIntent,
) -> Result<(), ActionError> {
    if seat >= SEAT_COUNT {
        return Err(ActionError::InvalidSeat(seat));
    }

    match intent {
        PlayerIntent::Discard { tile } => handle_discard(state, config, seat, *tile),
        PlayerIntent::DeclareWaiting { tile } => handle_declare_waiting(state, config, seat, *tile),
        PlayerIntent::SelfKong { option } => {
            require_turn(state, seat)?;
            require_discard_ready(state, seat)?;
            if !engine::self_kong_offers(state, seat).contains(option) {
                return Err(ActionError::InvalidKong);
            }
            engine::declare_self_kong(state, config, seat, *option);
            Ok(())
        }
        PlayerIntent::Claim { claim } => handle_claim(state, config, seat, claim),
        PlayerIntent::Pass => {
            require_eligible(state, seat)?;
            engine::pass_claim(state, config, seat);
            Ok(())
        }
        PlayerIntent::CancelClaim => {
            require_eligible(state, seat)?;
            if !engine::has_registered_claim(state, seat) {
                return Err(ActionError::NothingToCancel);
            }
            engine::cancel_claim(state, seat);
            Ok(())
        }
        PlayerIntent::Ready => handle_ready(state, config, seat),
    }
}

fn handle_discard(state: &mut MatchState, config: &TableConfig, seat: Seat, tile: TileId) -> Result<(), ActionError> {
    require_turn(state, seat)?;
    require_discard_ready(state, seat)?;
    require_tile(state, seat, tile)?;

    let player = state.player(seat);
    if player.waiting && player.last_drawn != Some(tile) {
        return Err(ActionError::WaitingDiscardLocked);
    }

    engine::discard_tile(state, config, seat, tile, false);
    Ok(())
}

fn handle_declare_waiting(
    state: &mut MatchState,
    config: &TableConfig,
    seat: Seat,
    tile: TileId,
) -> Result<(), ActionError> {
    require_turn(state, seat)?;
    require_discard_ready(state, seat)?;
    if state.player(seat).waiting {
        return Err(ActionError::AlreadyWaiting);
    }
    require_tile(state, seat, tile)?;

    let player = state.player(seat);
    if waiting_kinds(&player.counts_without(tile), player.meld_count()).is_empty() {
        return Err(ActionError::NotWaiting);
    }

    engine::declare_waiting(state, config, seat, tile);
    Ok(())
}

/// Inside a window: register a claim. Outside: only a self-drawn win.
fn handle_claim(
    state: &mut MatchState,
    config: &TableConfig,
    seat: Seat,
    claim: &ClaimOption,
) -> Result<(), ActionError> {
    if state.window_open() {
        require_eligible(state, seat)?;
        engine::register_claim(state, config, seat, claim.clone());
        return Ok(());
    }

    let ClaimOption::Win { combination } = claim else {
        return Err(ActionError::ClaimWindowClosed);
    };
    require_turn(state, seat)?;
    if !engine::self_win_options(state, seat).contains(combination) {
        return Err(ActionError::NoSelfWin);
    }
    engine::claim_self_win(state, seat, combination.clone());
    Ok(())
}

fn handle_ready(state: &mut MatchState, config: &TableConfig, seat: Seat) -> Result<(), ActionError> {
    if state.match_over {
        return Err(ActionError::MatchOver);
    }
    if state.phase != MatchPhase::Ended {
        return Err(ActionError::WrongPhase { phase: state.phase });
    }
    if state.player(seat).ready {
        return Err(ActionError::AlreadyReady);
    }
    engine::mark_ready(state, config, seat);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::engine::start_hand;
    use crate::game::kong::KongOption;
    use crate::game::state::PlayerId;
    use crate::game::tile::{parse_kinds, TileCounts};
    use crate::game::win::find_winning_combinations;

    fn started() -> (MatchState, TableConfig) {
        let ids = [5u8, 6, 7, 8].map(|i| PlayerId::new([i; 16]));
        let mut state = MatchState::new([1; 16], ids, 77);
        let config = TableConfig::default();
        start_hand(&mut state, &config);
        state.take_events();
        (state, config)
    }

    fn assert_untouched(state: &MatchState, before: [u8; 32], result: Result<(), ActionError>, expected: ActionError) {
        assert_eq!(result, Err(expected));
        assert_eq!(state.compute_hash(), before);
        assert!(state.pending_events.is_empty());
    }

    #[test]
    fn test_turn_and_tile_checks() {
        let (mut state, config) = started();
        let before = state.compute_hash();

        let other = state.player(1).hand[0].id;
        let result = handle_intent(&mut state, &config, 1, &PlayerIntent::Discard { tile: other });
        assert_untouched(&state, before, result, ActionError::WrongTurn { expected: 0 });

        let result = handle_intent(&mut state, &config, 0, &PlayerIntent::Discard { tile: other });
        assert_untouched(&state, before, result, ActionError::TileNotInHand(other));

        let result = handle_intent(&mut state, &config, 4, &PlayerIntent::Pass);
        assert_untouched(&state, before, result, ActionError::InvalidSeat(4));
    }

    #[test]
    fn test_window_intents_without_a_window() {
        let (mut state, config) = started();
        let before = state.compute_hash();

        let result = handle_intent(&mut state, &config, 2, &PlayerIntent::Pass);
        assert_untouched(&state, before, result, ActionError::ClaimWindowClosed);

        let result = handle_intent(&mut state, &config, 2, &PlayerIntent::CancelClaim);
        assert_untouched(&state, before, result, ActionError::ClaimWindowClosed);

        let pong = ClaimOption::Pong { tiles: [TileId(0), TileId(1)] };
        let result = handle_intent(&mut state, &config, 0, &PlayerIntent::Claim { claim: pong });
        assert_untouched(&state, before, result, ActionError::ClaimWindowClosed);
    }

    #[test]
    fn test_unoffered_self_declarations() {
        let (mut state, config) = started();
        let before = state.compute_hash();

        let kong = KongOption::Extended { kind: state.player(0).hand[0].kind, meld_index: 3 };
        let result = handle_intent(&mut state, &config, 0, &PlayerIntent::SelfKong { option: kong });
        assert_untouched(&state, before, result, ActionError::InvalidKong);

        let counts = TileCounts::from_kinds(parse_kinds("123m 456m 789m 123p 456p 7p").unwrap());
        let combination = find_winning_combinations(&counts, parse_kinds("7p").unwrap()[0], 0).remove(0);
        let claim = ClaimOption::Win { combination };
        let result = handle_intent(&mut state, &config, 0, &PlayerIntent::Claim { claim });
        assert_untouched(&state, before, result, ActionError::NoSelfWin);
    }

    #[test]
    fn test_discard_needs_the_extra_tile() {
        let (mut state, config) = started();
        let tile = state.player(0).hand[0].id;
        handle_intent(&mut state, &config, 0, &PlayerIntent::Discard { tile }).unwrap();
        state.take_events();

        // Seat 0 now holds 16 tiles; force the turn back without a draw.
        state.claim_window = None;
        state.current = 0;
        let before = state.compute_hash();
        let tile = state.player(0).hand[0].id;
        let result = handle_intent(&mut state, &config, 0, &PlayerIntent::Discard { tile });
        assert_untouched(&state, before, result, ActionError::InvalidHandSize { size: 16 });
    }

    #[test]
    fn test_ready_outside_hand_end() {
        let (mut state, config) = started();
        let before = state.compute_hash();
        let result = handle_intent(&mut state, &config, 3, &PlayerIntent::Ready);
        assert_untouched(&state, before, result, ActionError::WrongPhase { phase: MatchPhase::DrawDiscard });
    }

    #[test]
    fn test_error_codes_serialize_snake_case() {
        let json = serde_json::to_string(&ActionError::WaitingDiscardLocked.code()).unwrap();
        assert_eq!(json, "\"waiting_discard_locked\"");
        assert_eq!(ActionError::NotWaiting.to_string(), "hand would not be waiting after that discard");
    }
}
