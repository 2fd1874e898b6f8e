//! Declared melds.

use serde::{Serialize, Deserialize};

use crate::game::tile::{Seat, Tile, TileId, TileKind};

/// Meld type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeldKind {
    /// Three identical tiles, one claimed.
    Pong,
    /// Three consecutive numerals, one claimed.
    Chow,
    /// Four identical tiles, exposed (claimed or extended from a pong).
    Kong,
    /// Four identical tiles declared from hand, hidden until hand end.
    ConcealedKong,
}

/// A set of tiles laid down by one player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meld {
    /// Meld type.
    pub kind: MeldKind,
    /// Tiles (3 or 4), sorted by kind.
    pub tiles: Vec<Tile>,
    /// Hidden from opponents until the hand ends.
    pub concealed: bool,
    /// Seat whose discard completed the meld, if any.
    pub claimed_from: Option<Seat>,
}

impl Meld {
    /// Create a meld from claimed or declared tiles.
    pub fn new(kind: MeldKind, mut tiles: Vec<Tile>, claimed_from: Option<Seat>) -> Self {
        tiles.sort_by_key(|t| (t.kind, t.id));
        Self {
            kind,
            tiles,
            concealed: kind == MeldKind::ConcealedKong,
            claimed_from,
        }
    }

    /// Kind of the lowest tile.
    pub fn base_kind(&self) -> Option<TileKind> {
        self.tiles.first().map(|t| t.kind)
    }

    /// Check whether this is a pong of `kind`, eligible for extension.
    pub fn is_pong_of(&self, kind: TileKind) -> bool {
        self.kind == MeldKind::Pong && self.base_kind() == Some(kind)
    }

    /// Turn a pong into an exposed kong with a fourth tile.
    pub fn extend(&mut self, tile: Tile) {
        self.kind = MeldKind::Kong;
        self.tiles.push(tile);
    }

    /// Tile ids in the meld.
    pub fn tile_ids(&self) -> impl ExactSizeIterator<Item = TileId> + '_ {
        self.tiles.iter().map(|t| t.id)
    }

    /// What opponents may see: concealed kongs show only their size.
    pub fn public_view(&self) -> MeldView {
        MeldView {
            kind: self.kind,
            size: self.tiles.len(),
            tiles: if self.concealed { None } else { Some(self.tiles.clone()) },
        }
    }
}

/// Opponent-facing meld.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeldView {
    /// Meld type.
    pub kind: MeldKind,
    /// Tile count.
    pub size: usize,
    /// Tiles, `None` while concealed.
    pub tiles: Option<Vec<Tile>>,
}
