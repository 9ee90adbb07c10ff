//! The 40-tile board table.

use serde::Serialize;

use super::{BOARD_SIZE, Money, RAILROAD_INDICES, UTILITY_INDICES};

/// Color group of a buildable property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyGroup {
    /// Meme coins (brown).
    Meme,
    /// Layer 2 networks (light blue).
    Layer2,
    /// DeFi protocols (pink).
    Defi,
    /// Smart contract platforms (orange).
    Smart,
    /// Oracles and infrastructure (red).
    Oracle,
    /// Rising stars (yellow).
    Rising,
    /// Layer 1 giants (green).
    Layer1,
    /// Elite tier (dark blue).
    Elite,
}

impl PropertyGroup {
    /// Every group in board order.
    pub const ALL: [Self; 8] = [
        Self::Meme,
        Self::Layer2,
        Self::Defi,
        Self::Smart,
        Self::Oracle,
        Self::Rising,
        Self::Layer1,
        Self::Elite,
    ];

    /// Cost of one house (and of the hotel step) on any tile of this group.
    #[must_use]
    pub const fn house_cost(self) -> Money {
        match self {
            Self::Meme | Self::Layer2 => 50,
            Self::Defi | Self::Smart => 100,
            Self::Oracle | Self::Rising => 150,
            Self::Layer1 | Self::Elite => 200,
        }
    }

    /// Human-readable group name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Meme => "Meme Coins",
            Self::Layer2 => "Layer 2",
            Self::Defi => "DeFi",
            Self::Smart => "Smart Contracts",
            Self::Oracle => "Infrastructure",
            Self::Rising => "Rising Stars",
            Self::Layer1 => "Layer 1",
            Self::Elite => "Elite",
        }
    }
}

/// A buildable property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyTile {
    /// Color group.
    pub group: PropertyGroup,
    /// Purchase price.
    pub price: Money,
    /// Rent by house count: base, 1-4 houses, hotel.
    pub rent: [Money; 6],
    /// Cost of one house.
    pub house_cost: Money,
    /// Cash received when mortgaging.
    pub mortgage: Money,
}

/// An exchange (railroad) tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RailroadTile {
    /// Purchase price.
    pub price: Money,
    /// Rent by number of exchanges the owner holds (1-4).
    pub rent: [Money; 4],
    /// Cash received when mortgaging.
    pub mortgage: Money,
}

/// A mining/staking (utility) tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilityTile {
    /// Purchase price.
    pub price: Money,
    /// Cash received when mortgaging.
    pub mortgage: Money,
}

/// What a tile does when landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TileKind {
    /// Start tile; salary is paid when passing it.
    Go,
    /// Buildable property.
    Property(PropertyTile),
    /// Exchange.
    Railroad(RailroadTile),
    /// Mining or staking utility.
    Utility(UtilityTile),
    /// Flat tax paid into the free parking pot.
    Tax {
        /// Amount due.
        amount: Money,
    },
    /// Draw from the chance deck.
    Chance,
    /// Draw from the community chest deck.
    CommunityChest,
    /// Jail (or just visiting).
    Jail,
    /// Collects the pot of taxes and fees.
    FreeParking,
    /// Sends the player straight to jail.
    GoToJail,
}

/// One tile of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tile {
    /// Position on the board (0-39).
    pub index: u8,
    /// Display name.
    pub name: &'static str,
    /// Landing behavior and economics.
    #[serde(flatten)]
    pub kind: TileKind,
}

impl Tile {
    /// Purchase price, for purchasable tiles.
    #[must_use]
    pub const fn price(&self) -> Option<Money> {
        match &self.kind {
            TileKind::Property(p) => Some(p.price),
            TileKind::Railroad(r) => Some(r.price),
            TileKind::Utility(u) => Some(u.price),
            _ => None,
        }
    }

    /// Mortgage value, for purchasable tiles.
    #[must_use]
    pub const fn mortgage(&self) -> Option<Money> {
        match &self.kind {
            TileKind::Property(p) => Some(p.mortgage),
            TileKind::Railroad(r) => Some(r.mortgage),
            TileKind::Utility(u) => Some(u.mortgage),
            _ => None,
        }
    }

    /// Whether the tile can be owned.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.price().is_some()
    }

    /// Buildable property data, if this is a property tile.
    #[must_use]
    pub const fn as_property(&self) -> Option<&PropertyTile> {
        match &self.kind {
            TileKind::Property(p) => Some(p),
            _ => None,
        }
    }
}

const fn special(index: u8, name: &'static str, kind: TileKind) -> Tile {
    Tile { index, name, kind }
}

const fn property(
    index: u8,
    name: &'static str,
    group: PropertyGroup,
    price: Money,
    rent: [Money; 6],
    mortgage: Money,
) -> Tile {
    Tile {
        index,
        name,
        kind: TileKind::Property(PropertyTile {
            group,
            price,
            rent,
            house_cost: group.house_cost(),
            mortgage,
        }),
    }
}

const fn railroad(index: u8, name: &'static str) -> Tile {
    Tile {
        index,
        name,
        kind: TileKind::Railroad(RailroadTile {
            price: 200,
            rent: [25, 50, 100, 200],
            mortgage: 100,
        }),
    }
}

const fn utility(index: u8, name: &'static str) -> Tile {
    Tile {
        index,
        name,
        kind: TileKind::Utility(UtilityTile {
            price: 150,
            mortgage: 75,
        }),
    }
}

use PropertyGroup::{Defi, Elite, Layer1, Layer2, Meme, Oracle, Rising, Smart};

/// The board, indexed by position.
pub static TILES: [Tile; BOARD_SIZE as usize] = [
    special(0, "Collect 200 USDT", TileKind::Go),
    property(1, "Dogecoin Den", Meme, 60, [2, 10, 30, 90, 160, 250], 30),
    special(2, "Airdrop", TileKind::CommunityChest),
    property(3, "Shiba Inu Shack", Meme, 60, [4, 20, 60, 180, 320, 450], 30),
    special(4, "Gas Fees", TileKind::Tax { amount: 200 }),
    railroad(5, "Binance Station"),
    property(6, "Polygon Plaza", Layer2, 100, [6, 30, 90, 270, 400, 550], 50),
    special(7, "Market Volatility", TileKind::Chance),
    property(8, "Arbitrum Avenue", Layer2, 100, [6, 30, 90, 270, 400, 550], 50),
    property(9, "Optimism Oasis", Layer2, 120, [8, 40, 100, 300, 450, 600], 60),
    special(10, "Rug Pull Jail", TileKind::Jail),
    property(11, "Uniswap Unicorn", Defi, 140, [10, 50, 150, 450, 625, 750], 70),
    utility(12, "Mining Farm"),
    property(13, "Aave Atrium", Defi, 140, [10, 50, 150, 450, 625, 750], 70),
    property(14, "Compound Castle", Defi, 160, [12, 60, 180, 500, 700, 900], 80),
    railroad(15, "Coinbase Central"),
    property(16, "Cardano Cove", Smart, 180, [14, 70, 200, 550, 750, 950], 90),
    special(17, "Airdrop", TileKind::CommunityChest),
    property(18, "Avalanche Alps", Smart, 180, [14, 70, 200, 550, 750, 950], 90),
    property(19, "Polkadot Park", Smart, 200, [16, 80, 220, 600, 800, 1000], 100),
    special(20, "HODL Parking", TileKind::FreeParking),
    property(21, "Chainlink Link", Oracle, 220, [18, 90, 250, 700, 875, 1050], 110),
    special(22, "Market Volatility", TileKind::Chance),
    property(23, "Cosmos Hub", Oracle, 220, [18, 90, 250, 700, 875, 1050], 110),
    property(24, "Tezos Tower", Oracle, 240, [20, 100, 300, 750, 925, 1100], 120),
    railroad(25, "Kraken Depot"),
    property(26, "Near Protocol", Rising, 260, [22, 110, 330, 800, 975, 1150], 130),
    property(27, "Fantom Forest", Rising, 260, [22, 110, 330, 800, 975, 1150], 130),
    utility(28, "Staking Pool"),
    property(29, "Hedera Heights", Rising, 280, [24, 120, 360, 850, 1025, 1200], 140),
    special(30, "SEC Investigation", TileKind::GoToJail),
    property(31, "Solana Beach", Layer1, 300, [26, 130, 390, 900, 1100, 1275], 150),
    property(32, "BNB Boulevard", Layer1, 300, [26, 130, 390, 900, 1100, 1275], 150),
    special(33, "Airdrop", TileKind::CommunityChest),
    property(34, "XRP Rapids", Layer1, 320, [28, 150, 450, 1000, 1200, 1400], 160),
    railroad(35, "OKX Terminal"),
    special(36, "Market Volatility", TileKind::Chance),
    property(37, "Ethereum Heights", Elite, 350, [35, 175, 500, 1100, 1300, 1500], 175),
    special(38, "Capital Gains Tax", TileKind::Tax { amount: 100 }),
    property(39, "Bitcoin Jungle", Elite, 400, [50, 200, 600, 1400, 1700, 2000], 200),
];

/// Look up a tile by board index.
#[must_use]
pub fn tile(index: u8) -> Option<&'static Tile> {
    TILES.get(usize::from(index))
}

/// Board indices of every tile in a color group.
#[must_use]
pub const fn tiles_in_group(group: PropertyGroup) -> &'static [u8] {
    match group {
        Meme => &[1, 3],
        Layer2 => &[6, 8, 9],
        Defi => &[11, 13, 14],
        Smart => &[16, 18, 19],
        Oracle => &[21, 23, 24],
        Rising => &[26, 27, 29],
        Layer1 => &[31, 32, 34],
        Elite => &[37, 39],
    }
}

/// First exchange strictly ahead of `from`, wrapping past GO.
#[must_use]
pub fn next_railroad(from: u8) -> u8 {
    next_of(&RAILROAD_INDICES, from)
}

/// First utility strictly ahead of `from`, wrapping past GO.
#[must_use]
pub fn next_utility(from: u8) -> u8 {
    next_of(&UTILITY_INDICES, from)
}

fn next_of(indices: &[u8], from: u8) -> u8 {
    indices
        .iter()
        .copied()
        .find(|&i| i > from)
        .unwrap_or(indices[0])
}
