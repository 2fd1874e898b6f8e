//! Tile Wall
//!
//! Builds the 144-tile population, shuffles it with the match RNG and
//! hands tiles out one at a time. Draws come off the front.

use std::collections::VecDeque;
use thiserror::Error;

use crate::core::rng::DeterministicRng;
use crate::game::tile::{Suit, Tile, TileKind, TOTAL_TILES};

/// Wall errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WallError {
    /// No tiles left to draw; the hand ends without a winner.
    #[error("wall exhausted")]
    Exhausted,
}

/// The draw wall.
#[derive(Debug, Clone)]
pub struct TileWall {
    tiles: VecDeque<Tile>,
}

impl TileWall {
    /// Create the full, unshuffled population.
    ///
    /// Ids are assigned in build order: 4 copies of every numeral, wind
    /// and dragon kind, then one of each flower and season.
    pub fn new() -> Self {
        let mut tiles = VecDeque::with_capacity(TOTAL_TILES);
        let mut next_id = 0u8;

        for suit in Suit::ALL {
            for value in 1..=suit.max_value() {
                for _ in 0..suit.copies() {
                    tiles.push_back(Tile::new(next_id, TileKind::new(suit, value)));
                    next_id += 1;
                }
            }
        }

        Self { tiles }
    }

    /// Uniform random permutation (Fisher-Yates).
    pub fn shuffle(&mut self, rng: &mut DeterministicRng) {
        rng.shuffle(self.tiles.make_contiguous());
    }

    /// Draw one tile.
    pub fn draw(&mut self) -> Result<Tile, WallError> {
        self.tiles.pop_front().ok_or(WallError::Exhausted)
    }

    /// Tiles left. O(1).
    #[inline]
    pub fn remaining(&self) -> usize {
        self.tiles.len()
    }

    /// Check whether the wall is empty.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Pull the first tile of `kind` out of the wall.
    ///
    /// Used by debug dealing to hand named seats a fixed hand.
    pub fn take_kind(&mut self, kind: TileKind) -> Option<Tile> {
        let pos = self.tiles.iter().position(|t| t.kind == kind)?;
        self.tiles.remove(pos)
    }

    /// Move one tile of each listed kind to the front, in order.
    ///
    /// Kinds no longer in the wall are skipped. Returns how many moved.
    pub fn stack_front(&mut self, kinds: &[TileKind]) -> usize {
        let mut stacked = Vec::with_capacity(kinds.len());
        for kind in kinds {
            if let Some(tile) = self.take_kind(*kind) {
                stacked.push(tile);
            }
        }
        let moved = stacked.len();
        for tile in stacked.into_iter().rev() {
            self.tiles.push_front(tile);
        }
        moved
    }

    /// Iterate remaining tiles in draw order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Tile> {
        self.tiles.iter()
    }
}

impl Default for TileWall {
    fn default() -> Self {
        Self::new()
    }
}
