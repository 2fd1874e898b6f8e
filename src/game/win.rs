//! Winning Hand Validation
//!
//! Pure functions over [`TileCounts`] deciding whether the concealed part
//! of a hand completes a winning shape, and enumerating every way it does.
//!
//! ## Shapes
//!
//! - **Standard**: `5 - melds` sets (triplets or same-suit runs) plus one pair.
//! - **Pong plus pairs**: one concealed triplet plus seven pairs, only with
//!   no declared melds.
//!
//! ## Algorithm
//!
//! Every kind with two or more copies is tried as the pair. The remainder is
//! then decomposed by always consuming the lowest remaining kind: either as a
//! triplet of itself or as the low end of a run. Both branches are explored,
//! so a kind held four times is tried both as triplet + single and as part
//! of runs. Honors never form runs.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

use crate::game::tile::{TileCounts, TileKind, KIND_COUNT};

/// Sets (plus one pair) in a complete hand.
pub const SETS_IN_HAND: usize = 5;

/// Pairs needed alongside the triplet in the pong-plus-pairs shape.
pub const PAIRS_IN_PONG_PLUS_PAIRS: usize = 7;

/// Sets the concealed tiles must supply given `meld_count` declared melds.
#[inline]
pub fn required_sets(meld_count: usize) -> usize {
    SETS_IN_HAND.saturating_sub(meld_count)
}

/// Which winning shape a decomposition uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinShape {
    /// Sets plus one pair.
    Standard,
    /// One triplet plus seven pairs.
    PongPlusPairs,
}

/// One set inside a decomposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "set", content = "kind", rename_all = "snake_case")]
pub enum SetShape {
    /// Three identical tiles.
    Triplet(TileKind),
    /// Three consecutive numerals; holds the lowest kind.
    Run(TileKind),
}

impl SetShape {
    /// Check whether this set uses a tile of `kind`.
    pub fn contains(&self, kind: TileKind) -> bool {
        match *self {
            SetShape::Triplet(k) => k == kind,
            SetShape::Run(low) => {
                low.suit == kind.suit && kind.value >= low.value && kind.value <= low.value + 2
            }
        }
    }

    /// Kinds making up the set.
    pub fn kinds(&self) -> [TileKind; 3] {
        match *self {
            SetShape::Triplet(k) => [k, k, k],
            SetShape::Run(low) => [
                low,
                TileKind::new(low.suit, low.value + 1),
                TileKind::new(low.suit, low.value + 2),
            ],
        }
    }
}

/// Role the just-added tile plays in a decomposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileRole {
    /// Completes the pair.
    Pair,
    /// Completes a triplet.
    Triplet,
    /// Completes a run.
    Run,
}

/// One distinct way a hand wins.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WinningCombination {
    /// Shape used.
    pub shape: WinShape,
    /// Pairs, sorted (one for standard, seven for pong-plus-pairs).
    pub pairs: Vec<TileKind>,
    /// Concealed sets, sorted.
    pub sets: Vec<SetShape>,
    /// The just-added tile.
    pub last_tile: TileKind,
    /// What the just-added tile completes.
    pub last_tile_role: TileRole,
    /// The set the just-added tile completes, `None` when it completes a pair.
    pub completed_set: Option<SetShape>,
}

// =============================================================================
// DECISION
// =============================================================================

/// Check whether the concealed tiles form a winning hand.
///
/// `counts` holds every concealed non-bonus tile, including the last one.
pub fn is_winning_hand(counts: &TileCounts, meld_count: usize) -> bool {
    is_standard_win(counts, required_sets(meld_count))
        || (meld_count == 0 && pong_plus_pairs_split(counts).is_some())
}

fn is_standard_win(counts: &TileCounts, sets: usize) -> bool {
    if counts.total() != sets * 3 + 2 {
        return false;
    }
    (0..KIND_COUNT).filter(|&i| counts.at(i) >= 2).any(|i| {
        let mut rest = *counts;
        TileKind::from_index(i).is_some_and(|pair| rest.remove_n(pair, 2) && can_form_sets(&rest, sets))
    })
}

/// Check whether `counts` splits into exactly `sets` triplets/runs.
fn can_form_sets(counts: &TileCounts, sets: usize) -> bool {
    let Some(i) = counts.first_nonzero() else {
        return sets == 0;
    };
    if sets == 0 {
        return false;
    }
    let Some(kind) = TileKind::from_index(i) else {
        return false;
    };

    if counts.at(i) >= 3 {
        let mut rest = *counts;
        if rest.remove_n(kind, 3) && can_form_sets(&rest, sets - 1) {
            return true;
        }
    }

    match take_run(counts, kind) {
        Some(rest) => can_form_sets(&rest, sets - 1),
        None => false,
    }
}

/// Remove the run starting at `low`, if all three kinds are present.
fn take_run(counts: &TileCounts, low: TileKind) -> Option<TileCounts> {
    let mid = low.offset(1)?;
    let high = low.offset(2)?;
    let mut rest = *counts;
    (rest.remove_n(low, 1) && rest.remove_n(mid, 1) && rest.remove_n(high, 1)).then_some(rest)
}

/// Split into (triplet kind, seven pairs) if the pong-plus-pairs shape fits.
fn pong_plus_pairs_split(counts: &TileCounts) -> Option<(TileKind, Vec<TileKind>)> {
    if counts.total() != 3 + PAIRS_IN_PONG_PLUS_PAIRS * 2 {
        return None;
    }

    let mut triplet = None;
    let mut pairs = Vec::with_capacity(PAIRS_IN_PONG_PLUS_PAIRS);
    for (kind, count) in counts.iter() {
        match count {
            2 => pairs.push(kind),
            4 => {
                pairs.push(kind);
                pairs.push(kind);
            }
            3 if triplet.is_none() => triplet = Some(kind),
            _ => return None,
        }
    }

    let triplet = triplet?;
    (pairs.len() == PAIRS_IN_PONG_PLUS_PAIRS).then_some((triplet, pairs))
}

// =============================================================================
// ENUMERATION
// =============================================================================

/// Every way `counts` splits into exactly `sets` sets.
fn enumerate_sets(counts: TileCounts, sets: usize, acc: &mut Vec<SetShape>, out: &mut Vec<Vec<SetShape>>) {
    let Some(i) = counts.first_nonzero() else {
        if sets == 0 {
            out.push(acc.clone());
        }
        return;
    };
    if sets == 0 {
        return;
    }
    let Some(kind) = TileKind::from_index(i) else {
        return;
    };

    if counts.at(i) >= 3 {
        let mut rest = counts;
        if rest.remove_n(kind, 3) {
            acc.push(SetShape::Triplet(kind));
            enumerate_sets(rest, sets - 1, acc, out);
            acc.pop();
        }
    }

    if let Some(rest) = take_run(&counts, kind) {
        acc.push(SetShape::Run(kind));
        enumerate_sets(rest, sets - 1, acc, out);
        acc.pop();
    }
}

/// Enumerate every distinct winning decomposition of `hand + last`.
///
/// `hand` holds the concealed non-bonus tiles before the last tile was
/// added. Each result is tagged with the role of `last`; when the last tile
/// could complete different parts of the same decomposition, each
/// interpretation is reported separately so the player can choose.
pub fn find_winning_combinations(
    hand: &TileCounts,
    last: TileKind,
    meld_count: usize,
) -> Vec<WinningCombination> {
    let mut full = *hand;
    if !full.add(last) {
        return Vec::new();
    }

    let mut found: BTreeSet<WinningCombination> = BTreeSet::new();
    let sets = required_sets(meld_count);

    if full.total() == sets * 3 + 2 {
        for i in (0..KIND_COUNT).filter(|&i| full.at(i) >= 2) {
            let Some(pair) = TileKind::from_index(i) else {
                continue;
            };
            let mut rest = full;
            if !rest.remove_n(pair, 2) {
                continue;
            }

            let mut decompositions = Vec::new();
            enumerate_sets(rest, sets, &mut Vec::with_capacity(sets), &mut decompositions);

            for mut decomposition in decompositions {
                decomposition.sort();
                if pair == last {
                    found.insert(standard(pair, &decomposition, last, TileRole::Pair, None));
                }
                for set in decomposition.iter().filter(|s| s.contains(last)) {
                    let role = match set {
                        SetShape::Triplet(_) => TileRole::Triplet,
                        SetShape::Run(_) => TileRole::Run,
                    };
                    found.insert(standard(pair, &decomposition, last, role, Some(*set)));
                }
            }
        }
    }

    if meld_count == 0 {
        if let Some((triplet, pairs)) = pong_plus_pairs_split(&full) {
            let combo = |role, completed_set| WinningCombination {
                shape: WinShape::PongPlusPairs,
                pairs: pairs.clone(),
                sets: vec![SetShape::Triplet(triplet)],
                last_tile: last,
                last_tile_role: role,
                completed_set,
            };
            if triplet == last {
                found.insert(combo(TileRole::Triplet, Some(SetShape::Triplet(triplet))));
            }
            if pairs.contains(&last) {
                found.insert(combo(TileRole::Pair, None));
            }
        }
    }

    found.into_iter().collect()
}

fn standard(
    pair: TileKind,
    sets: &[SetShape],
    last: TileKind,
    role: TileRole,
    completed_set: Option<SetShape>,
) -> WinningCombination {
    WinningCombination {
        shape: WinShape::Standard,
        pairs: vec![pair],
        sets: sets.to_vec(),
        last_tile: last,
        last_tile_role: role,
        completed_set,
    }
}

/// Kinds that would complete the hand if added.
///
/// `counts` holds a hand waiting to draw (3n+1 concealed tiles). Kinds
/// whose four copies are already all in the hand are skipped.
pub fn waiting_kinds(counts: &TileCounts, meld_count: usize) -> Vec<TileKind> {
    TileKind::playable()
        .filter(|&kind| counts.get(kind) < 4)
        .filter(|&kind| {
            let mut with = *counts;
            with.add(kind) && is_winning_hand(&with, meld_count)
        })
        .collect()
}
