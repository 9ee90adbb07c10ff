//! Chance ("Market Volatility") and community chest ("Airdrop") decks.

use serde::{Deserialize, Serialize};

use super::Money;

/// Which of the two decks a card belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeckKind {
    /// Market volatility deck.
    Chance,
    /// Airdrop deck.
    CommunityChest,
}

impl DeckKind {
    /// Display name of the deck.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Chance => "Market Volatility",
            Self::CommunityChest => "Airdrop",
        }
    }
}

/// Target kind for "advance to nearest" cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NearestKind {
    /// Nearest exchange.
    Railroad,
    /// Nearest mining/staking tile.
    Utility,
}

/// Effect of a card once executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum CardAction {
    /// Bank pays the player.
    Collect {
        /// Amount received.
        amount: Money,
    },
    /// Player pays into the free parking pot.
    Pay {
        /// Amount paid.
        amount: Money,
    },
    /// Player pays every other active player.
    PayEachPlayer {
        /// Amount per player.
        amount: Money,
    },
    /// Every other active player pays the player, capped at what they hold.
    CollectFromEach {
        /// Amount per player.
        amount: Money,
    },
    /// Move to an absolute tile.
    MoveTo {
        /// Destination.
        tile_index: u8,
        /// Whether passing GO on the way pays salary.
        #[serde(default = "default_collect_go")]
        collect_go: bool,
    },
    /// Move backwards.
    MoveBack {
        /// Number of tiles.
        spaces: u8,
    },
    /// Straight to jail.
    GoToJail,
    /// Keep a get-out-of-jail-free card.
    GetOutOfJailFree,
    /// Pay for every house and hotel owned.
    Repairs {
        /// Cost per house.
        per_house: Money,
        /// Cost per hotel.
        per_hotel: Money,
    },
    /// Advance to the nearest exchange or utility.
    AdvanceToNearest {
        /// Kind of tile to move to.
        tile_type: NearestKind,
        /// Rent multiplier if the tile is owned by another player.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pay_multiple: Option<Money>,
    },
}

const fn default_collect_go() -> bool {
    true
}

/// A card drawn from one of the decks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    /// Stable identifier, e.g. `chance-3`.
    pub id: String,
    /// Deck the card belongs to.
    #[serde(rename = "type")]
    pub deck: DeckKind,
    /// Short headline.
    pub title: String,
    /// Full card text.
    pub description: String,
    /// Effect applied on execution.
    pub action: CardAction,
}

struct CardDef {
    title: &'static str,
    description: &'static str,
    action: CardAction,
}

const fn def(title: &'static str, description: &'static str, action: CardAction) -> CardDef {
    CardDef {
        title,
        description,
        action,
    }
}

const CHANCE: [CardDef; 16] = [
    def(
        "Bull Run!",
        "Advance to Bitcoin Jungle. If you pass GO, collect $200.",
        CardAction::MoveTo { tile_index: 39, collect_go: true },
    ),
    def(
        "Pump It!",
        "Advance to Solana Beach. If you pass GO, collect $200.",
        CardAction::MoveTo { tile_index: 31, collect_go: true },
    ),
    def(
        "Exchange Listing",
        "Advance to the nearest Exchange. Pay owner twice the normal rent.",
        CardAction::AdvanceToNearest { tile_type: NearestKind::Railroad, pay_multiple: Some(2) },
    ),
    def(
        "Mining Rewards",
        "Advance to nearest Mining/Staking. Pay owner 10x dice roll.",
        CardAction::AdvanceToNearest { tile_type: NearestKind::Utility, pay_multiple: Some(10) },
    ),
    def(
        "Staking Rewards",
        "Bank pays you dividend of $50.",
        CardAction::Collect { amount: 50 },
    ),
    def(
        "Get Out of Jail Free",
        "Keep this card until needed. Get out of Rug Pull Jail free.",
        CardAction::GetOutOfJailFree,
    ),
    def("Flash Crash", "Go back 3 spaces.", CardAction::MoveBack { spaces: 3 }),
    def(
        "SEC Investigation",
        "Go directly to Rug Pull Jail. Do not pass GO. Do not collect $200.",
        CardAction::GoToJail,
    ),
    def(
        "Smart Contract Bug",
        "Make general repairs on all your properties: $25 per house, $100 per hotel.",
        CardAction::Repairs { per_house: 25, per_hotel: 100 },
    ),
    def(
        "Network Fee Spike",
        "Pay poor tax of $15.",
        CardAction::Pay { amount: 15 },
    ),
    def(
        "Layer 2 Migration",
        "Advance to Polygon Plaza. If you pass GO, collect $200.",
        CardAction::MoveTo { tile_index: 6, collect_go: true },
    ),
    def(
        "DeFi Summer",
        "Advance to Uniswap Unicorn. If you pass GO, collect $200.",
        CardAction::MoveTo { tile_index: 11, collect_go: true },
    ),
    def(
        "VC Funding Round",
        "Your building and loan matures. Collect $150.",
        CardAction::Collect { amount: 150 },
    ),
    def(
        "Whale Alert",
        "You have been elected Chairman of the Board. Pay each player $50.",
        CardAction::PayEachPlayer { amount: 50 },
    ),
    def(
        "Return to Genesis",
        "Advance to GO. Collect $200.",
        CardAction::MoveTo { tile_index: 0, collect_go: true },
    ),
    def(
        "Exchange Hack",
        "Advance to the nearest Exchange. Pay owner twice the normal rent.",
        CardAction::AdvanceToNearest { tile_type: NearestKind::Railroad, pay_multiple: Some(2) },
    ),
];

const COMMUNITY_CHEST: [CardDef; 16] = [
    def(
        "Retroactive Airdrop",
        "Advance to GO. Collect $200.",
        CardAction::MoveTo { tile_index: 0, collect_go: true },
    ),
    def(
        "Protocol Treasury",
        "Bank error in your favor. Collect $200.",
        CardAction::Collect { amount: 200 },
    ),
    def("Tax Return", "Doctor's fees. Pay $50.", CardAction::Pay { amount: 50 }),
    def(
        "NFT Sale",
        "From sale of NFTs you get $50.",
        CardAction::Collect { amount: 50 },
    ),
    def(
        "Get Out of Jail Free",
        "Keep this card until needed. Get out of Rug Pull Jail free.",
        CardAction::GetOutOfJailFree,
    ),
    def(
        "SEC Investigation",
        "Go directly to Rug Pull Jail. Do not pass GO. Do not collect $200.",
        CardAction::GoToJail,
    ),
    def(
        "Holiday Airdrop",
        "Xmas fund matures. Collect $100.",
        CardAction::Collect { amount: 100 },
    ),
    def(
        "Tax Refund",
        "Income tax refund. Collect $20.",
        CardAction::Collect { amount: 20 },
    ),
    def(
        "Community Rewards",
        "It is your birthday. Collect $10 from every player.",
        CardAction::CollectFromEach { amount: 10 },
    ),
    def(
        "Life Insurance",
        "Life insurance matures. Collect $100.",
        CardAction::Collect { amount: 100 },
    ),
    def("Hospital Fees", "Pay hospital $100.", CardAction::Pay { amount: 100 }),
    def("School Fees", "Pay school tax of $150.", CardAction::Pay { amount: 150 }),
    def(
        "Consulting Fee",
        "Receive $25 consultancy fee.",
        CardAction::Collect { amount: 25 },
    ),
    def(
        "Property Assessment",
        "You are assessed for street repairs: $40 per house, $115 per hotel.",
        CardAction::Repairs { per_house: 40, per_hotel: 115 },
    ),
    def(
        "Hackathon Prize",
        "You have won second prize in a hackathon. Collect $10.",
        CardAction::Collect { amount: 10 },
    ),
    def(
        "Token Sale",
        "From token sale you inherit $100.",
        CardAction::Collect { amount: 100 },
    ),
];

fn build_deck(deck: DeckKind, prefix: &str, defs: &[CardDef]) -> Vec<Card> {
    defs.iter()
        .enumerate()
        .map(|(i, d)| Card {
            id: format!("{prefix}-{}", i + 1),
            deck,
            title: d.title.to_string(),
            description: d.description.to_string(),
            action: d.action,
        })
        .collect()
}

/// The full, unshuffled chance deck.
#[must_use]
pub fn chance_deck() -> Vec<Card> {
    build_deck(DeckKind::Chance, "chance", &CHANCE)
}

/// The full, unshuffled community chest deck.
#[must_use]
pub fn community_chest_deck() -> Vec<Card> {
    build_deck(DeckKind::CommunityChest, "chest", &COMMUNITY_CHEST)
}

impl DeckKind {
    /// The full, unshuffled deck of this kind.
    #[must_use]
    pub fn full_deck(self) -> Vec<Card> {
        match self {
            Self::Chance => chance_deck(),
            Self::CommunityChest => community_chest_deck(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_sizes_and_ids() {
        let chance = chance_deck();
        let chest = community_chest_deck();
        assert_eq!(chance.len(), 16);
        assert_eq!(chest.len(), 16);
        assert_eq!(chance[0].id, "chance-1");
        assert_eq!(chest[15].id, "chest-16");
        assert!(chance.iter().all(|c| c.deck == DeckKind::Chance));
        assert!(chest.iter().all(|c| c.deck == DeckKind::CommunityChest));
    }

    #[test]
    fn test_card_wire_shape() {
        let card = &chance_deck()[2];
        let json = serde_json::to_value(card).unwrap();
        assert_eq!(json["type"], "chance");
        assert_eq!(json["action"]["type"], "advance-to-nearest");
        assert_eq!(json["action"]["tileType"], "railroad");
        assert_eq!(json["action"]["payMultiple"], 2);
    }

    #[test]
    fn test_move_to_collect_go_defaults_true() {
        let action: CardAction =
            serde_json::from_str(r#"{"type":"move-to","tileIndex":5}"#).unwrap();
        assert_eq!(
            action,
            CardAction::MoveTo {
                tile_index: 5,
                collect_go: true
            }
        );
    }
}
