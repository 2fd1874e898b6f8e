//! Claim Arbitration
//!
//! Computes what each opponent may do with a just-discarded tile, collects
//! their responses while the window is open and picks the winner when it
//! closes.
//!
//! ## Priority
//!
//! Win > Kong > Pong > Chow. Two or more registered wins form a
//! multi-winner outcome instead of being arbitrated. Ties within one claim
//! type go to the seat closest to the discarder in turn order.
//!
//! Registration order never matters: resolution only looks at what is
//! registered when the window closes.

use std::collections::{BTreeMap, BTreeSet};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::game::tile::{next_seat, Seat, Tile, TileCounts, TileId, TileKind, SEAT_COUNT};
use crate::game::timer::TimerId;
use crate::game::win::{find_winning_combinations, WinningCombination};

// =============================================================================
// CLAIM OPTIONS
// =============================================================================

/// Claim type, ordered by ascending priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    /// Run with the discard (next seat only).
    Chow,
    /// Triplet with the discard.
    Pong,
    /// Quad with the discard.
    Kong,
    /// Win with the discard.
    Win,
}

/// A concrete claim on a discard, naming the hand tiles it commits.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaimOption {
    /// Two matching tiles from hand.
    Pong {
        /// Hand tiles committed.
        tiles: [TileId; 2],
    },
    /// Three matching tiles from hand.
    Kong {
        /// Hand tiles committed.
        tiles: [TileId; 3],
    },
    /// Two tiles completing a run with the discard.
    Chow {
        /// Hand tiles committed.
        tiles: [TileId; 2],
    },
    /// Win with the discard using a specific decomposition.
    Win {
        /// Decomposition chosen.
        combination: WinningCombination,
    },
}

impl ClaimOption {
    /// Claim type.
    pub fn kind(&self) -> ClaimKind {
        match self {
            ClaimOption::Pong { .. } => ClaimKind::Pong,
            ClaimOption::Kong { .. } => ClaimKind::Kong,
            ClaimOption::Chow { .. } => ClaimKind::Chow,
            ClaimOption::Win { .. } => ClaimKind::Win,
        }
    }

    /// Hand tiles the claim moves into a meld. Empty for wins.
    pub fn hand_tiles(&self) -> &[TileId] {
        match self {
            ClaimOption::Pong { tiles } | ClaimOption::Chow { tiles } => tiles,
            ClaimOption::Kong { tiles } => tiles,
            ClaimOption::Win { .. } => &[],
        }
    }
}

/// Inputs for one opponent's candidate computation.
#[derive(Clone, Copy, Debug)]
pub struct ClaimContext<'a> {
    /// Concealed hand.
    pub hand: &'a [Tile],
    /// Declared melds.
    pub meld_count: usize,
    /// Waiting players may only win.
    pub waiting: bool,
    /// Only the next seat may chow.
    pub is_next_seat: bool,
}

/// Every claim `ctx` may make on `tile`.
pub fn claim_options(ctx: ClaimContext<'_>, tile: Tile) -> Vec<ClaimOption> {
    let mut options = win_options(ctx.hand, ctx.meld_count, tile);
    if ctx.waiting || tile.is_bonus() {
        return options;
    }

    let matching: Vec<TileId> = ctx.hand.iter().filter(|t| t.kind == tile.kind).map(|t| t.id).collect();
    if let [a, b, c, ..] = matching[..] {
        options.push(ClaimOption::Kong { tiles: [a, b, c] });
    }
    if let [a, b, ..] = matching[..] {
        options.push(ClaimOption::Pong { tiles: [a, b] });
    }
    if ctx.is_next_seat {
        options.extend(chow_options(ctx.hand, tile.kind));
    }

    options
}

/// Win claims only; used for rob-the-kong and by waiting players.
pub fn win_options(hand: &[Tile], meld_count: usize, tile: Tile) -> Vec<ClaimOption> {
    find_winning_combinations(&TileCounts::from_tiles(hand), tile.kind, meld_count)
        .into_iter()
        .map(|combination| ClaimOption::Win { combination })
        .collect()
}

/// Runs completed by `kind`, one per distinct resulting run.
///
/// The discard may sit low, middle or high in the run; each placement is
/// checked on its own.
fn chow_options(hand: &[Tile], kind: TileKind) -> Vec<ClaimOption> {
    let first_of = |k: TileKind| hand.iter().find(|t| t.kind == k).map(|t| t.id);

    let mut seen: BTreeSet<TileKind> = BTreeSet::new();
    let mut options = Vec::new();
    for (low_offset, others) in [(0i8, [1i8, 2]), (-1, [-1, 1]), (-2, [-2, -1])] {
        let Some(low) = kind.offset(low_offset) else {
            continue;
        };
        let Some(a) = kind.offset(others[0]).and_then(first_of) else {
            continue;
        };
        let Some(b) = kind.offset(others[1]).and_then(first_of) else {
            continue;
        };
        if seen.insert(low) {
            options.push(ClaimOption::Chow { tiles: [a, b] });
        }
    }
    options
}

/// Check that a submitted claim is structurally sound against the hand.
///
/// Wins must match one of the offered decompositions; melds must name
/// distinct hand tiles that form the set with `tile`.
pub fn is_valid_claim(
    option: &ClaimOption,
    offered: &[ClaimOption],
    hand: &[Tile],
    tile: Tile,
) -> bool {
    if !offered.iter().any(|o| o.kind() == option.kind()) {
        return false;
    }

    let ids = option.hand_tiles();
    let distinct: BTreeSet<TileId> = ids.iter().copied().collect();
    if distinct.len() != ids.len() {
        return false;
    }
    let Some(kinds) = ids
        .iter()
        .map(|id| hand.iter().find(|t| t.id == *id).map(|t| t.kind))
        .collect::<Option<Vec<TileKind>>>()
    else {
        return false;
    };

    match option {
        ClaimOption::Win { .. } => offered.contains(option),
        ClaimOption::Pong { .. } | ClaimOption::Kong { .. } => kinds.iter().all(|k| *k == tile.kind),
        ClaimOption::Chow { .. } => forms_run(&kinds, tile.kind),
    }
}

fn forms_run(hand_kinds: &[TileKind], discard: TileKind) -> bool {
    let mut kinds: Vec<TileKind> = hand_kinds.to_vec();
    kinds.push(discard);
    kinds.sort();
    match kinds[..] {
        [a, b, c] => a.offset(1) == Some(b) && b.offset(1) == Some(c),
        _ => false,
    }
}

// =============================================================================
// CLAIM WINDOW
// =============================================================================

/// Result of closing a window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimResolution {
    /// Nobody claimed.
    NoClaim,
    /// One or more wins, closest seat to the discarder first.
    Wins(Vec<(Seat, WinningCombination)>),
    /// A meld claim that beat every other registration.
    Meld {
        /// Claimant.
        seat: Seat,
        /// Winning claim.
        option: ClaimOption,
    },
}

/// Why a response was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ResponseError {
    /// Seat has no options in this window.
    #[error("seat has no claim options in this window")]
    NotEligible,
    /// Cancel without a registered claim.
    #[error("no registered claim to cancel")]
    NothingToCancel,
}

/// Open window on one tile.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClaimWindow {
    /// Seat that gave up the tile.
    pub discarder: Seat,
    /// The tile.
    pub tile: Tile,
    /// Options per eligible seat.
    pub candidates: BTreeMap<Seat, Vec<ClaimOption>>,
    /// Claims registered so far.
    pub registered: BTreeMap<Seat, ClaimOption>,
    /// Seats that passed.
    pub passed: BTreeSet<Seat>,
    /// Freeze timer guarding this window.
    pub timer: Option<TimerId>,
}

impl ClaimWindow {
    /// Open a window; `None` when nobody has an option.
    pub fn open(discarder: Seat, tile: Tile, candidates: BTreeMap<Seat, Vec<ClaimOption>>) -> Option<Self> {
        let candidates: BTreeMap<_, _> = candidates.into_iter().filter(|(_, o)| !o.is_empty()).collect();
        if candidates.is_empty() {
            return None;
        }
        Some(Self {
            discarder,
            tile,
            candidates,
            registered: BTreeMap::new(),
            passed: BTreeSet::new(),
            timer: None,
        })
    }

    /// Options offered to `seat`.
    pub fn options_for(&self, seat: Seat) -> Option<&[ClaimOption]> {
        self.candidates.get(&seat).map(Vec::as_slice)
    }

    /// Record a claim, replacing any earlier response from the seat.
    pub fn register(&mut self, seat: Seat, option: ClaimOption) -> Result<(), ResponseError> {
        if !self.candidates.contains_key(&seat) {
            return Err(ResponseError::NotEligible);
        }
        self.passed.remove(&seat);
        self.registered.insert(seat, option);
        Ok(())
    }

    /// Record a pass, dropping any registered claim.
    pub fn pass(&mut self, seat: Seat) -> Result<(), ResponseError> {
        if !self.candidates.contains_key(&seat) {
            return Err(ResponseError::NotEligible);
        }
        self.registered.remove(&seat);
        self.passed.insert(seat);
        Ok(())
    }

    /// Withdraw a registered claim; the seat is undecided again.
    pub fn cancel(&mut self, seat: Seat) -> Result<ClaimOption, ResponseError> {
        if !self.candidates.contains_key(&seat) {
            return Err(ResponseError::NotEligible);
        }
        self.registered.remove(&seat).ok_or(ResponseError::NothingToCancel)
    }

    /// Every eligible seat has registered or passed.
    pub fn all_responded(&self) -> bool {
        self.candidates
            .keys()
            .all(|seat| self.registered.contains_key(seat) || self.passed.contains(seat))
    }

    /// Seats still undecided.
    pub fn pending_seats(&self) -> Vec<Seat> {
        self.candidates
            .keys()
            .filter(|seat| !self.registered.contains_key(seat) && !self.passed.contains(seat))
            .copied()
            .collect()
    }

    /// Turn-order distance from the discarder (1..4).
    fn distance(&self, seat: Seat) -> usize {
        (seat + SEAT_COUNT - self.discarder) % SEAT_COUNT
    }

    /// Pick the outcome from what is registered now.
    pub fn resolve(&self) -> ClaimResolution {
        let mut wins: Vec<(Seat, WinningCombination)> = self
            .registered
            .iter()
            .filter_map(|(seat, option)| match option {
                ClaimOption::Win { combination } => Some((*seat, combination.clone())),
                _ => None,
            })
            .collect();
        if !wins.is_empty() {
            wins.sort_by_key(|(seat, _)| self.distance(*seat));
            return ClaimResolution::Wins(wins);
        }

        self.registered
            .iter()
            .max_by_key(|(seat, option)| (option.kind(), std::cmp::Reverse(self.distance(**seat))))
            .map_or(ClaimResolution::NoClaim, |(seat, option)| ClaimResolution::Meld {
                seat: *seat,
                option: option.clone(),
            })
    }

    /// Seat allowed to chow on this window's tile.
    pub fn chow_seat(&self) -> Seat {
        next_seat(self.discarder)
    }
}

/// Extended kong waiting on opposing win claims before its replacement draw.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingRobKong {
    /// Seat that extended the pong.
    pub declarer: Seat,
    /// Index of the extended meld.
    pub meld_index: usize,
    /// Window restricted to win claims.
    pub window: ClaimWindow,
}
