//! Player intents as they travel over the wire.

use serde::{Deserialize, Serialize};

use crate::board::{Card, DeckKind, Money};
use crate::game::{DiceRoll, PlayerId, Token, TradeOffer};

/// Every action the reducer understands.
///
/// Serialized as `{"type": "ROLL_DICE", "playerId": ..., ...}`. The set is
/// closed; anything else fails to decode and is dropped by the sync layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum GameAction {
    /// Register a player, or rename an already registered one.
    JoinGame {
        /// Player joining.
        player_id: PlayerId,
        /// Display name.
        player_name: String,
    },
    /// Remove a player from the room.
    LeaveGame {
        /// Player leaving.
        player_id: PlayerId,
    },
    /// Pick a playing piece in the lobby.
    SelectToken {
        /// Player choosing.
        player_id: PlayerId,
        /// Chosen token.
        token: Token,
    },
    /// Start the game. Host only.
    StartGame {
        /// Explicit turn order; empty means shuffle.
        #[serde(default)]
        turn_order: Vec<PlayerId>,
    },
    /// Roll the dice.
    RollDice {
        /// Player rolling.
        player_id: PlayerId,
        /// Authoritative face values.
        result: DiceRoll,
        /// Animation seed chosen by the rolling peer.
        seed: u32,
    },
    /// Buy the tile under a pending buy decision.
    BuyProperty {
        /// Buyer.
        player_id: PlayerId,
        /// Tile to buy.
        tile_index: u8,
    },
    /// Decline to buy and open an auction.
    AuctionProperty {
        /// Player declining.
        player_id: PlayerId,
        /// Tile to auction.
        tile_index: u8,
    },
    /// Bid in the open auction.
    PlaceBid {
        /// Bidder.
        player_id: PlayerId,
        /// New bid.
        amount: Money,
    },
    /// Leave the open auction.
    PassAuction {
        /// Player passing.
        player_id: PlayerId,
    },
    /// Settle pending rent.
    PayRent {
        /// Payer.
        player_id: PlayerId,
        /// Amount paid.
        amount: Money,
        /// Recipient.
        to_player_id: PlayerId,
    },
    /// Settle pending tax.
    PayTax {
        /// Payer.
        player_id: PlayerId,
        /// Amount paid.
        amount: Money,
    },
    /// Draw the pending card.
    DrawCard {
        /// Player drawing.
        player_id: PlayerId,
        /// Deck to draw from.
        card_type: DeckKind,
    },
    /// Execute the drawn card.
    ExecuteCard {
        /// Player executing.
        player_id: PlayerId,
        /// The drawn card.
        card: Card,
    },
    /// Build one house (or the hotel).
    BuildHouse {
        /// Owner.
        player_id: PlayerId,
        /// Tile to improve.
        tile_index: u8,
    },
    /// Sell one house back to the bank.
    SellHouse {
        /// Owner.
        player_id: PlayerId,
        /// Tile to reduce.
        tile_index: u8,
    },
    /// Mortgage an unimproved tile.
    MortgageProperty {
        /// Owner.
        player_id: PlayerId,
        /// Tile to mortgage.
        tile_index: u8,
    },
    /// Lift a mortgage.
    UnmortgageProperty {
        /// Owner.
        player_id: PlayerId,
        /// Tile to unmortgage.
        tile_index: u8,
    },
    /// Pay the fine to leave jail before rolling.
    PayJailFine {
        /// Jailed player.
        player_id: PlayerId,
    },
    /// Spend a get-out-of-jail-free card.
    UseJailCard {
        /// Jailed player.
        player_id: PlayerId,
    },
    /// Offer a trade. The reducer assigns the id and pending status.
    ProposeTrade {
        /// Offer details.
        offer: TradeOffer,
    },
    /// Accept a pending trade. Counterparty only.
    AcceptTrade {
        /// Counterparty accepting.
        player_id: PlayerId,
        /// Trade to accept.
        trade_id: String,
    },
    /// Reject a pending trade. Counterparty only.
    RejectTrade {
        /// Counterparty rejecting.
        player_id: PlayerId,
        /// Trade to reject.
        trade_id: String,
    },
    /// Withdraw a pending trade. Proposer only.
    CancelTrade {
        /// Proposer withdrawing.
        player_id: PlayerId,
        /// Trade to withdraw.
        trade_id: String,
    },
    /// Concede, handing holdings to a creditor or back to the bank.
    DeclareBankruptcy {
        /// Player conceding.
        player_id: PlayerId,
        /// Creditor, or none for the bank.
        creditor_id: Option<PlayerId>,
    },
    /// End the current turn.
    EndTurn {
        /// Current player.
        player_id: PlayerId,
    },
}

impl GameAction {
    /// Player on whose behalf the action is issued, if the action names one.
    #[must_use]
    pub fn actor(&self) -> Option<&str> {
        match self {
            Self::StartGame { .. } => None,
            Self::ProposeTrade { offer } => Some(&offer.from_player_id),
            Self::JoinGame { player_id, .. }
            | Self::LeaveGame { player_id }
            | Self::SelectToken { player_id, .. }
            | Self::RollDice { player_id, .. }
            | Self::BuyProperty { player_id, .. }
            | Self::AuctionProperty { player_id, .. }
            | Self::PlaceBid { player_id, .. }
            | Self::PassAuction { player_id }
            | Self::PayRent { player_id, .. }
            | Self::PayTax { player_id, .. }
            | Self::DrawCard { player_id, .. }
            | Self::ExecuteCard { player_id, .. }
            | Self::BuildHouse { player_id, .. }
            | Self::SellHouse { player_id, .. }
            | Self::MortgageProperty { player_id, .. }
            | Self::UnmortgageProperty { player_id, .. }
            | Self::PayJailFine { player_id }
            | Self::UseJailCard { player_id }
            | Self::AcceptTrade { player_id, .. }
            | Self::RejectTrade { player_id, .. }
            | Self::CancelTrade { player_id, .. }
            | Self::DeclareBankruptcy { player_id, .. }
            | Self::EndTurn { player_id } => Some(player_id),
        }
    }

    /// Wire tag of the action, e.g. `ROLL_DICE`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::JoinGame { .. } => "JOIN_GAME",
            Self::LeaveGame { .. } => "LEAVE_GAME",
            Self::SelectToken { .. } => "SELECT_TOKEN",
            Self::StartGame { .. } => "START_GAME",
            Self::RollDice { .. } => "ROLL_DICE",
            Self::BuyProperty { .. } => "BUY_PROPERTY",
            Self::AuctionProperty { .. } => "AUCTION_PROPERTY",
            Self::PlaceBid { .. } => "PLACE_BID",
            Self::PassAuction { .. } => "PASS_AUCTION",
            Self::PayRent { .. } => "PAY_RENT",
            Self::PayTax { .. } => "PAY_TAX",
            Self::DrawCard { .. } => "DRAW_CARD",
            Self::ExecuteCard { .. } => "EXECUTE_CARD",
            Self::BuildHouse { .. } => "BUILD_HOUSE",
            Self::SellHouse { .. } => "SELL_HOUSE",
            Self::MortgageProperty { .. } => "MORTGAGE_PROPERTY",
            Self::UnmortgageProperty { .. } => "UNMORTGAGE_PROPERTY",
            Self::PayJailFine { .. } => "PAY_JAIL_FINE",
            Self::UseJailCard { .. } => "USE_JAIL_CARD",
            Self::ProposeTrade { .. } => "PROPOSE_TRADE",
            Self::AcceptTrade { .. } => "ACCEPT_TRADE",
            Self::RejectTrade { .. } => "REJECT_TRADE",
            Self::CancelTrade { .. } => "CANCEL_TRADE",
            Self::DeclareBankruptcy { .. } => "DECLARE_BANKRUPTCY",
            Self::EndTurn { .. } => "END_TURN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_dice_wire_shape() {
        let action = GameAction::RollDice {
            player_id: "p1".into(),
            result: DiceRoll(2, 4),
            seed: 77,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "ROLL_DICE");
        assert_eq!(json["playerId"], "p1");
        assert_eq!(json["result"], serde_json::json!([2, 4]));
        assert_eq!(json["seed"], 77);
    }

    #[test]
    fn test_kind_matches_serde_tag() {
        let actions = [
            GameAction::StartGame { turn_order: vec![] },
            GameAction::DeclareBankruptcy {
                player_id: "p".into(),
                creditor_id: None,
            },
            GameAction::PayJailFine {
                player_id: "p".into(),
            },
        ];
        for action in actions {
            let json = serde_json::to_value(&action).unwrap();
            assert_eq!(json["type"], action.kind());
        }
    }

    #[test]
    fn test_start_game_turn_order_optional() {
        let action: GameAction = serde_json::from_str(r#"{"type":"START_GAME"}"#).unwrap();
        assert_eq!(action, GameAction::StartGame { turn_order: vec![] });
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let parsed = serde_json::from_str::<GameAction>(r#"{"type":"CHAT_MESSAGE"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_actor() {
        let action = GameAction::EndTurn {
            player_id: "x".into(),
        };
        assert_eq!(action.actor(), Some("x"));
        assert_eq!(GameAction::StartGame { turn_order: vec![] }.actor(), None);
    }
}
