//! Player Intents
//!
//! Decoded inbound actions, one variant per action with only the fields
//! it needs. Seat identity comes from the session, never from the payload.

use serde::{Serialize, Deserialize};

use crate::game::claim::{ClaimKind, ClaimOption};
use crate::game::kong::KongOption;
use crate::game::tile::TileId;

/// An action a seated player asks the engine to perform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum PlayerIntent {
    /// Discard a tile from hand.
    Discard {
        /// Tile to discard.
        tile: TileId,
    },
    /// Declare waiting and discard a tile in the same move.
    DeclareWaiting {
        /// Tile to discard.
        tile: TileId,
    },
    /// Declare a kong from own tiles.
    SelfKong {
        /// One of the offered kong options.
        option: KongOption,
    },
    /// Claim the tile in an open window, or claim a self-drawn win.
    Claim {
        /// Claim with committed tiles or chosen decomposition.
        claim: ClaimOption,
    },
    /// Decline every claim in the open window.
    Pass,
    /// Withdraw a registered claim while the window is open.
    CancelClaim,
    /// Ready for the next hand.
    Ready,
}

impl PlayerIntent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            PlayerIntent::Discard { .. } => "discard",
            PlayerIntent::DeclareWaiting { .. } => "declare_waiting",
            PlayerIntent::SelfKong { .. } => "self_kong",
            PlayerIntent::Claim { claim } => match claim.kind() {
                ClaimKind::Chow => "claim_chow",
                ClaimKind::Pong => "claim_pong",
                ClaimKind::Kong => "claim_kong",
                ClaimKind::Win => "claim_win",
            },
            PlayerIntent::Pass => "pass",
            PlayerIntent::CancelClaim => "cancel_claim",
            PlayerIntent::Ready => "ready",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_json_shape() {
        let intent: PlayerIntent = serde_json::from_str(r#"{"intent":"discard","tile":17}"#).unwrap();
        assert_eq!(intent, PlayerIntent::Discard { tile: TileId(17) });

        let claim: PlayerIntent =
            serde_json::from_str(r#"{"intent":"claim","claim":{"type":"pong","tiles":[3,4]}}"#).unwrap();
        assert_eq!(claim.name(), "claim_pong");

        let pass: PlayerIntent = serde_json::from_str(r#"{"intent":"pass"}"#).unwrap();
        assert_eq!(pass, PlayerIntent::Pass);
    }

    #[test]
    fn test_unknown_intent_rejected() {
        assert!(serde_json::from_str::<PlayerIntent>(r#"{"intent":"steal"}"#).is_err());
    }
}
