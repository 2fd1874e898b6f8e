//! Tile Definitions
//!
//! The 144-tile population: three numeral suits (1-9), four winds,
//! three dragons, four flowers and four seasons.
//!
//! Tiles are matched by [`TileKind`] and identified by [`TileId`].

use std::fmt;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Seat index at the table (0..4), counted counter-clockwise from seat 0.
pub type Seat = usize;

/// Players at a table.
pub const SEAT_COUNT: usize = 4;

/// Number of distinct playable (non-bonus) kinds.
pub const KIND_COUNT: usize = 34;

/// Total tiles in a wall.
pub const TOTAL_TILES: usize = 144;

/// Next seat in turn order.
#[inline]
pub fn next_seat(seat: Seat) -> Seat {
    (seat + 1) % SEAT_COUNT
}

/// Seats after `from` in turn order, excluding `from` itself.
pub fn seats_after(from: Seat) -> impl Iterator<Item = Seat> {
    (1..SEAT_COUNT).map(move |offset| (from + offset) % SEAT_COUNT)
}

// =============================================================================
// SUIT
// =============================================================================

/// Tile suit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suit {
    /// Numeral suit A (characters), 1-9.
    Characters,
    /// Numeral suit B (dots), 1-9.
    Dots,
    /// Numeral suit C (bamboo), 1-9.
    Bamboo,
    /// Winds: 1 East, 2 South, 3 West, 4 North.
    Wind,
    /// Dragons: 1 Red, 2 Green, 3 White.
    Dragon,
    /// Bonus flowers, 1-4.
    Flower,
    /// Bonus seasons, 1-4.
    Season,
}

impl Suit {
    /// All suits in wall-building order.
    pub const ALL: [Suit; 7] = [
        Suit::Characters,
        Suit::Dots,
        Suit::Bamboo,
        Suit::Wind,
        Suit::Dragon,
        Suit::Flower,
        Suit::Season,
    ];

    /// Highest value in this suit.
    pub const fn max_value(self) -> u8 {
        match self {
            Suit::Characters | Suit::Dots | Suit::Bamboo => 9,
            Suit::Wind | Suit::Flower | Suit::Season => 4,
            Suit::Dragon => 3,
        }
    }

    /// Copies of each kind in the wall.
    pub const fn copies(self) -> usize {
        if self.is_bonus() { 1 } else { 4 }
    }

    /// Numeral suits are the only ones that form runs.
    pub const fn is_numeral(self) -> bool {
        matches!(self, Suit::Characters | Suit::Dots | Suit::Bamboo)
    }

    /// Flowers and seasons.
    pub const fn is_bonus(self) -> bool {
        matches!(self, Suit::Flower | Suit::Season)
    }

    fn letter(self) -> char {
        match self {
            Suit::Characters => 'm',
            Suit::Dots => 'p',
            Suit::Bamboo => 's',
            Suit::Wind | Suit::Dragon => 'z',
            Suit::Flower => 'f',
            Suit::Season => 'n',
        }
    }
}

// =============================================================================
// TILE KIND
// =============================================================================

/// What a tile matches as: suit plus value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileKind {
    /// Suit.
    pub suit: Suit,
    /// Value within the suit (1-based).
    pub value: u8,
}

impl TileKind {
    /// Create a kind without range checking.
    pub const fn new(suit: Suit, value: u8) -> Self {
        Self { suit, value }
    }

    /// Create a kind, rejecting out-of-range values.
    pub fn checked(suit: Suit, value: u8) -> Option<Self> {
        (1..=suit.max_value()).contains(&value).then_some(Self { suit, value })
    }

    /// Bonus tiles never take part in a winning hand.
    #[inline]
    pub fn is_bonus(self) -> bool {
        self.suit.is_bonus()
    }

    /// Dense index for count maps (0..34), `None` for bonus kinds.
    pub fn index(self) -> Option<usize> {
        let v = self.value as usize - 1;
        match self.suit {
            Suit::Characters => Some(v),
            Suit::Dots => Some(9 + v),
            Suit::Bamboo => Some(18 + v),
            Suit::Wind => Some(27 + v),
            Suit::Dragon => Some(31 + v),
            Suit::Flower | Suit::Season => None,
        }
    }

    /// Inverse of [`TileKind::index`].
    pub fn from_index(index: usize) -> Option<Self> {
        let (suit, base) = match index {
            0..=8 => (Suit::Characters, 0),
            9..=17 => (Suit::Dots, 9),
            18..=26 => (Suit::Bamboo, 18),
            27..=30 => (Suit::Wind, 27),
            31..=33 => (Suit::Dragon, 31),
            _ => return None,
        };
        Some(Self::new(suit, (index - base + 1) as u8))
    }

    /// Same-suit neighbour `offset` steps away, numerals only.
    pub fn offset(self, offset: i8) -> Option<Self> {
        if !self.suit.is_numeral() {
            return None;
        }
        let value = self.value as i8 + offset;
        if (1..=9).contains(&value) {
            Some(Self::new(self.suit, value as u8))
        } else {
            None
        }
    }

    /// Every playable kind in index order.
    pub fn playable() -> impl Iterator<Item = TileKind> {
        (0..KIND_COUNT).filter_map(TileKind::from_index)
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self.suit {
            Suit::Dragon => self.value + 4,
            _ => self.value,
        };
        write!(f, "{}{}", value, self.suit.letter())
    }
}

/// Errors from tile shorthand parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TileParseError {
    /// Digits without a trailing suit letter.
    #[error("digits without suit letter in {0:?}")]
    MissingSuit(String),
    /// Unknown suit letter.
    #[error("unknown suit letter {0:?}")]
    UnknownSuit(char),
    /// Value outside the suit's range.
    #[error("value {value} out of range for suit {suit:?}")]
    OutOfRange {
        /// Offending value.
        value: u8,
        /// Suit letter.
        suit: char,
    },
}

/// Parse compact shorthand such as `"123m 456p 789s 11z 567z 1f"`.
///
/// `m`/`p`/`s` are the numeral suits, `z` covers winds (1-4) and
/// dragons (5-7), `f` flowers and `n` seasons. Whitespace is ignored.
pub fn parse_kinds(text: &str) -> Result<Vec<TileKind>, TileParseError> {
    let mut kinds = Vec::new();
    let mut pending: Vec<u8> = Vec::new();

    for c in text.chars().filter(|c| !c.is_whitespace()) {
        if let Some(d) = c.to_digit(10) {
            pending.push(d as u8);
            continue;
        }
        for value in pending.drain(..) {
            let kind = match c {
                'm' => TileKind::checked(Suit::Characters, value),
                'p' => TileKind::checked(Suit::Dots, value),
                's' => TileKind::checked(Suit::Bamboo, value),
                'z' if value <= 4 => TileKind::checked(Suit::Wind, value),
                'z' => TileKind::checked(Suit::Dragon, value.saturating_sub(4)),
                'f' => TileKind::checked(Suit::Flower, value),
                'n' => TileKind::checked(Suit::Season, value),
                other => return Err(TileParseError::UnknownSuit(other)),
            };
            kinds.push(kind.ok_or(TileParseError::OutOfRange { value, suit: c })?);
        }
    }

    if !pending.is_empty() {
        return Err(TileParseError::MissingSuit(text.to_string()));
    }
    Ok(kinds)
}

// =============================================================================
// TILE
// =============================================================================

/// Unique tile identifier (0..144), stable for the whole hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub u8);

/// A physical tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tile {
    /// Identity.
    pub id: TileId,
    /// What it matches as.
    pub kind: TileKind,
}

impl Tile {
    /// Create a tile.
    pub const fn new(id: u8, kind: TileKind) -> Self {
        Self { id: TileId(id), kind }
    }

    /// Shorthand for `self.kind.is_bonus()`.
    #[inline]
    pub fn is_bonus(&self) -> bool {
        self.kind.is_bonus()
    }
}

/// Sort tiles for display: by kind, then id.
pub fn sort_tiles(tiles: &mut [Tile]) {
    tiles.sort_by_key(|t| (t.kind, t.id));
}

// =============================================================================
// WIND
// =============================================================================

/// Prevailing wind of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum Wind {
    /// First round.
    #[default]
    East,
    /// Second round.
    South,
    /// Third round.
    West,
    /// Fourth round.
    North,
}

impl Wind {
    /// Next wind, `None` after North.
    pub fn next(self) -> Option<Wind> {
        match self {
            Wind::East => Some(Wind::South),
            Wind::South => Some(Wind::West),
            Wind::West => Some(Wind::North),
            Wind::North => None,
        }
    }
}

// =============================================================================
// COUNT MAP
// =============================================================================

/// Multiset of playable kinds, indexed by [`TileKind::index`].
///
/// Copy-on-write friendly: the win search clones it per branch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCounts([u8; KIND_COUNT]);

impl Default for TileCounts {
    fn default() -> Self {
        Self([0; KIND_COUNT])
    }
}

impl TileCounts {
    /// Empty multiset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the playable kinds of an iterator; bonus kinds are skipped.
    pub fn from_kinds<I: IntoIterator<Item = TileKind>>(kinds: I) -> Self {
        let mut counts = Self::new();
        for kind in kinds {
            counts.add(kind);
        }
        counts
    }

    /// Count a tile slice.
    pub fn from_tiles(tiles: &[Tile]) -> Self {
        Self::from_kinds(tiles.iter().map(|t| t.kind))
    }

    /// Copies of `kind`.
    #[inline]
    pub fn get(&self, kind: TileKind) -> u8 {
        kind.index().map_or(0, |i| self.0[i])
    }

    /// Count at a raw index.
    #[inline]
    pub fn at(&self, index: usize) -> u8 {
        self.0[index]
    }

    /// Add one copy. Returns false for bonus kinds.
    pub fn add(&mut self, kind: TileKind) -> bool {
        match kind.index() {
            Some(i) => {
                self.0[i] += 1;
                true
            }
            None => false,
        }
    }

    /// Remove `n` copies if present.
    pub fn remove_n(&mut self, kind: TileKind, n: u8) -> bool {
        match kind.index() {
            Some(i) if self.0[i] >= n => {
                self.0[i] -= n;
                true
            }
            _ => false,
        }
    }

    /// Total tiles counted.
    pub fn total(&self) -> usize {
        self.0.iter().map(|&c| c as usize).sum()
    }

    /// Lowest index holding a tile.
    pub fn first_nonzero(&self) -> Option<usize> {
        self.0.iter().position(|&c| c > 0)
    }

    /// Kinds present with their counts.
    pub fn iter(&self) -> impl Iterator<Item = (TileKind, u8)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, c)| **c > 0)
            .filter_map(|(i, c)| TileKind::from_index(i).map(|k| (k, *c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip_covers_all_playable() {
        let kinds: Vec<_> = TileKind::playable().collect();
        assert_eq!(kinds.len(), KIND_COUNT);
        for (i, kind) in kinds.iter().enumerate() {
            assert_eq!(kind.index(), Some(i));
        }
        assert_eq!(TileKind::new(Suit::Flower, 1).index(), None);
    }

    #[test]
    fn test_offset_stays_in_numeral_suit() {
        let five = TileKind::new(Suit::Dots, 5);
        assert_eq!(five.offset(1), Some(TileKind::new(Suit::Dots, 6)));
        assert_eq!(five.offset(-4), Some(TileKind::new(Suit::Dots, 1)));
        assert_eq!(five.offset(5), None);
        assert_eq!(TileKind::new(Suit::Wind, 2).offset(1), None);
    }

    #[test]
    fn test_parse_kinds() {
        let kinds = parse_kinds("19m 5p 14z 57z 2f 3n").unwrap();
        assert_eq!(
            kinds,
            vec![
                TileKind::new(Suit::Characters, 1),
                TileKind::new(Suit::Characters, 9),
                TileKind::new(Suit::Dots, 5),
                TileKind::new(Suit::Wind, 1),
                TileKind::new(Suit::Wind, 4),
                TileKind::new(Suit::Dragon, 1),
                TileKind::new(Suit::Dragon, 3),
                TileKind::new(Suit::Flower, 2),
                TileKind::new(Suit::Season, 3),
            ]
        );
        assert_eq!(kinds[6].to_string(), "7z");
    }

    #[test]
    fn test_parse_kinds_errors() {
        assert!(matches!(parse_kinds("123"), Err(TileParseError::MissingSuit(_))));
        assert!(matches!(parse_kinds("1q"), Err(TileParseError::UnknownSuit('q'))));
        assert!(matches!(parse_kinds("8z"), Err(TileParseError::OutOfRange { .. })));
        assert!(matches!(parse_kinds("5f"), Err(TileParseError::OutOfRange { .. })));
    }

    #[test]
    fn test_counts_skip_bonus() {
        let counts = TileCounts::from_kinds(parse_kinds("112m 1f").unwrap());
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.get(TileKind::new(Suit::Characters, 1)), 2);
        assert_eq!(counts.first_nonzero(), Some(0));
    }

    #[test]
    fn test_seats_after() {
        assert_eq!(seats_after(2).collect::<Vec<_>>(), vec![3, 0, 1]);
        assert_eq!(next_seat(3), 0);
    }

    #[test]
    fn test_wind_cycle_ends_after_north() {
        assert_eq!(Wind::East.next(), Some(Wind::South));
        assert_eq!(Wind::North.next(), None);
    }
}
