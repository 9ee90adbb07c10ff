//! Game state management.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::{Card, DeckKind, Money, TILES, chance_deck, community_chest_deck};
use crate::game::{DeterministicRng, DiceRoll, Player, PlayerId, Players};

/// Coarse game lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Waiting for players; tokens may be chosen.
    Lobby,
    /// Game in progress.
    Playing,
    /// A winner has been decided.
    Finished,
}

/// Fine-grained phase within one player's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnPhase {
    /// Waiting for the current player to roll.
    PreRoll,
    /// Rolled and nothing is pending; the player may manage assets or end the turn.
    PostRoll,
    /// A pending action must be resolved.
    Action,
    /// The turn can only end (jail, failed jail roll).
    EndTurn,
}

/// Ownership and improvement state of one purchasable tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyState {
    /// Owner, if any.
    pub owner_id: Option<PlayerId>,
    /// 0-4 houses, 5 means hotel.
    pub houses: u8,
    /// Whether the tile is mortgaged.
    pub is_mortgaged: bool,
}

/// The single gate the current turn must resolve before progressing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum PendingAction {
    /// Buy the landed tile or send it to auction.
    BuyDecision {
        /// Tile on offer.
        tile_index: u8,
        /// Listed price.
        price: Money,
    },
    /// Open auction for a declined tile.
    Auction {
        /// Tile on offer.
        tile_index: u8,
        /// Highest bid so far (0 = none).
        current_bid: Money,
        /// Holder of the highest bid.
        current_bidder_id: Option<PlayerId>,
        /// Players still in the auction.
        participants: Vec<PlayerId>,
    },
    /// Rent owed to another player.
    PayRent {
        /// Amount due.
        amount: Money,
        /// Recipient.
        to_player_id: PlayerId,
    },
    /// Tax owed to the pot.
    PayTax {
        /// Amount due.
        amount: Money,
    },
    /// A card must be drawn.
    DrawCard {
        /// Deck to draw from.
        card_type: DeckKind,
    },
    /// A drawn card must be executed.
    CardAction {
        /// The drawn card.
        card: Card,
    },
}

/// Lifecycle of a trade offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    /// Awaiting a response.
    Pending,
    /// Executed.
    Accepted,
    /// Declined by the counterparty.
    Rejected,
    /// Withdrawn by the proposer.
    Cancelled,
}

/// A proposed exchange of tiles and cash between two players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeOffer {
    /// Identifier assigned by the reducer.
    pub id: String,
    /// Proposer.
    pub from_player_id: PlayerId,
    /// Counterparty.
    pub to_player_id: PlayerId,
    /// Tiles the proposer gives.
    pub offered_properties: Vec<u8>,
    /// Cash the proposer gives.
    pub offered_money: Money,
    /// Tiles the proposer receives.
    pub requested_properties: Vec<u8>,
    /// Cash the proposer receives.
    pub requested_money: Money,
    /// Current status.
    pub status: TradeStatus,
}

/// Complete replicated game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Room identifier.
    pub room_id: String,
    /// Player id of the authoritative peer.
    pub host_id: PlayerId,
    /// Coarse lifecycle.
    pub phase: Phase,
    /// Player ids in turn order, fixed at game start.
    pub turn_order: Vec<PlayerId>,
    /// Index into `turn_order` of the player whose turn it is.
    pub current_player_index: usize,
    /// Phase within the current turn.
    pub turn_phase: TurnPhase,
    /// Last roll's faces.
    pub current_dice_roll: Option<DiceRoll>,
    /// Incremented once per resolved roll.
    pub last_dice_roll_id: u64,
    /// Animation seed paired with the last roll.
    pub last_dice_roll_seed: Option<u32>,
    /// Consecutive doubles in the current turn.
    pub doubles_count: u8,
    /// Players keyed by id, in join order.
    pub players: Players,
    /// State of every purchasable tile.
    #[serde(with = "tile_keyed")]
    pub properties: BTreeMap<u8, PropertyState>,
    /// Remaining chance deck, drawn from the front.
    pub chance_cards: Vec<Card>,
    /// Remaining community chest deck, drawn from the front.
    pub community_chest_cards: Vec<Card>,
    /// Card drawn and awaiting execution.
    pub drawn_card: Option<Card>,
    /// Pot of taxes and fees.
    pub free_parking: Money,
    /// Outstanding gate for the current turn.
    pub pending_action: Option<PendingAction>,
    /// Trade offers, filtered to pending ones at each turn end.
    pub trade_offers: Vec<TradeOffer>,
    /// Counter used to mint trade ids.
    #[serde(default)]
    pub trade_seq: u64,
    /// Winner once the game is finished.
    pub winner_id: Option<PlayerId>,
    /// Creation time (ms since the Unix epoch).
    pub created_at: u64,
    /// Time of the last accepted action (ms since the Unix epoch).
    pub last_update_at: u64,
}

impl GameState {
    /// Create a fresh lobby.
    ///
    /// `deck_seed` shuffles both card decks; the host picks it once and every
    /// guest receives the resulting decks in snapshots.
    #[must_use]
    pub fn new(
        room_id: impl Into<String>,
        host_id: impl Into<PlayerId>,
        deck_seed: u64,
        now_ms: u64,
    ) -> Self {
        let mut rng = DeterministicRng::new(deck_seed);
        let mut chance_cards = chance_deck();
        let mut community_chest_cards = community_chest_deck();
        rng.shuffle(&mut chance_cards);
        rng.shuffle(&mut community_chest_cards);

        Self {
            room_id: room_id.into(),
            host_id: host_id.into(),
            phase: Phase::Lobby,
            turn_order: Vec::new(),
            current_player_index: 0,
            turn_phase: TurnPhase::PreRoll,
            current_dice_roll: None,
            last_dice_roll_id: 0,
            last_dice_roll_seed: None,
            doubles_count: 0,
            players: Players::new(),
            properties: initial_properties(),
            chance_cards,
            community_chest_cards,
            drawn_card: None,
            free_parking: 0,
            pending_action: None,
            trade_offers: Vec::new(),
            trade_seq: 0,
            winner_id: None,
            created_at: now_ms,
            last_update_at: now_ms,
        }
    }

    /// Id of the player whose turn it is.
    #[must_use]
    pub fn current_player_id(&self) -> Option<&PlayerId> {
        self.turn_order.get(self.current_player_index)
    }

    /// The player whose turn it is.
    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.current_player_id().and_then(|id| self.players.get(id))
    }

    /// Whether `player_id` is the current player.
    #[must_use]
    pub fn is_current(&self, player_id: &str) -> bool {
        self.current_player_id().is_some_and(|id| id == player_id)
    }

    /// Index of the next non-bankrupt player after the current one.
    ///
    /// Falls back to the current index if nobody else is eligible.
    #[must_use]
    pub fn next_player_index(&self) -> usize {
        let len = self.turn_order.len();
        if len == 0 {
            return 0;
        }
        (1..=len)
            .map(|step| (self.current_player_index + step) % len)
            .find(|&i| {
                self.players
                    .get(&self.turn_order[i])
                    .is_some_and(|p| !p.is_bankrupt)
            })
            .unwrap_or(self.current_player_index)
    }

    /// Players not yet eliminated, in join order.
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.is_bankrupt)
    }

    /// Owner of a tile, if any.
    #[must_use]
    pub fn owner_of(&self, index: u8) -> Option<&PlayerId> {
        self.properties.get(&index).and_then(|p| p.owner_id.as_ref())
    }

    /// Whether two replicas describe the same game, ignoring wall-clock stamps.
    #[must_use]
    pub fn same_game(&self, other: &Self) -> bool {
        let mut a = self.clone();
        a.last_update_at = other.last_update_at;
        a.created_at = other.created_at;
        a == *other
    }
}

/// Tile-indexed maps travel as JSON objects, so keys are strings on the wire.
///
/// Inside a tagged [`crate::sync::Envelope`] serde buffers the object before
/// decoding it and no longer coerces `"6"` into a `u8`; the keys are parsed
/// here instead.
mod tile_keyed {
    use std::collections::BTreeMap;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::PropertyState;

    pub(super) fn serialize<S: Serializer>(
        map: &BTreeMap<u8, PropertyState>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        map.serialize(serializer)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<u8, PropertyState>, D::Error> {
        BTreeMap::<String, PropertyState>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, property)| {
                key.parse::<u8>()
                    .map(|index| (index, property))
                    .map_err(|_| D::Error::custom(format!("invalid tile index {key:?}")))
            })
            .collect()
    }
}

fn initial_properties() -> BTreeMap<u8, PropertyState> {
    TILES
        .iter()
        .filter(|t| t.is_purchasable())
        .map(|t| (t.index, PropertyState::default()))
        .collect()
}
