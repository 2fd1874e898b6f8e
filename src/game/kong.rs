//! Self-declared kong options.
//!
//! A pure query over the current hand and melds; the engine applies
//! whichever option the player picks.

use serde::{Serialize, Deserialize};

use crate::game::meld::Meld;
use crate::game::tile::{Tile, TileCounts, TileKind};

/// A kong the turn owner may declare from their own tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KongOption {
    /// All four copies held in hand.
    Concealed {
        /// Kind declared.
        kind: TileKind,
    },
    /// Fourth copy added to an existing pong.
    Extended {
        /// Kind declared.
        kind: TileKind,
        /// Index of the pong in the player's melds.
        meld_index: usize,
    },
}

impl KongOption {
    /// Kind declared.
    pub fn kind(&self) -> TileKind {
        match *self {
            KongOption::Concealed { kind } | KongOption::Extended { kind, .. } => kind,
        }
    }

    /// Extended kongs are open to rob-the-kong; concealed ones never are.
    pub fn is_robbable(&self) -> bool {
        matches!(self, KongOption::Extended { .. })
    }
}

/// Every kong legally declarable from `hand` given `melds`.
pub fn self_kong_options(hand: &[Tile], melds: &[Meld]) -> Vec<KongOption> {
    let counts = TileCounts::from_tiles(hand);

    let concealed = counts
        .iter()
        .filter(|&(_, count)| count == 4)
        .map(|(kind, _)| KongOption::Concealed { kind });

    let extended = melds.iter().enumerate().filter_map(|(meld_index, meld)| {
        let kind = meld.base_kind()?;
        (meld.is_pong_of(kind) && counts.get(kind) > 0).then_some(KongOption::Extended { kind, meld_index })
    });

    concealed.chain(extended).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::meld::MeldKind;
    use crate::game::tile::parse_kinds;

    fn hand(text: &str) -> Vec<Tile> {
        parse_kinds(text)
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(i, kind)| Tile::new(i as u8, kind))
            .collect()
    }

    #[test]
    fn test_concealed_kong_needs_four() {
        let options = self_kong_options(&hand("1111m 222p 5z"), &[]);
        let one = parse_kinds("1m").unwrap()[0];
        assert_eq!(options, vec![KongOption::Concealed { kind: one }]);
        assert!(!options[0].is_robbable());
    }

    #[test]
    fn test_extended_kong_from_pong() {
        let east = parse_kinds("1z").unwrap()[0];
        let pong = Meld::new(
            MeldKind::Pong,
            (100..103).map(|id| Tile::new(id, east)).collect(),
            Some(1),
        );
        let options = self_kong_options(&hand("1z 23m"), &[pong]);
        assert_eq!(options, vec![KongOption::Extended { kind: east, meld_index: 0 }]);
        assert!(options[0].is_robbable());
    }

    #[test]
    fn test_chow_and_kong_melds_not_extended() {
        let chow = Meld::new(MeldKind::Chow, hand("345m"), Some(3));
        assert!(self_kong_options(&hand("3m"), &[chow]).is_empty());
        assert!(self_kong_options(&hand("333m"), &[]).is_empty());
    }
}
