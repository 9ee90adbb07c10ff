//! Static board data.
//!
//! Everything in this module is immutable lookup data shared by every peer:
//! - The 40-tile board with prices, rent tables and mortgage values
//! - The two card decks (market volatility and airdrop)
//! - Economic constants (starting cash, GO salary, jail fine, ...)
//!
//! None of it carries behavior beyond simple lookups; the rules live in
//! [`crate::game`].

mod cards;
mod tiles;

pub use cards::{Card, CardAction, DeckKind, NearestKind, chance_deck, community_chest_deck};
pub use tiles::{
    PropertyGroup, PropertyTile, RailroadTile, TILES, Tile, TileKind, UtilityTile, next_railroad,
    next_utility, tile, tiles_in_group,
};

/// Signed amount of in-game currency.
///
/// Signed because mandatory payments (card fees, the third failed jail roll)
/// are allowed to push a balance below zero until the player raises funds
/// or declares bankruptcy.
pub type Money = i64;

/// Number of tiles on the board.
pub const BOARD_SIZE: u8 = 40;

/// Cash every player starts with.
pub const STARTING_MONEY: Money = 1500;

/// Salary collected when passing or landing on GO.
pub const GO_SALARY: Money = 200;

/// Fine paid to leave jail.
pub const JAIL_FINE: Money = 50;

/// Failed doubles attempts before the fine is charged automatically.
pub const MAX_JAIL_TURNS: u8 = 3;

/// Consecutive doubles that send a player to jail.
pub const MAX_DOUBLES: u8 = 3;

/// Index of the GO tile.
pub const GO_INDEX: u8 = 0;

/// Index of the jail tile.
pub const JAIL_INDEX: u8 = 10;

/// Index of the "go to jail" tile.
pub const GO_TO_JAIL_INDEX: u8 = 30;

/// Railroad (exchange) tile indices in board order.
pub const RAILROAD_INDICES: [u8; 4] = [5, 15, 25, 35];

/// Utility (mining/staking) tile indices in board order.
pub const UTILITY_INDICES: [u8; 2] = [12, 28];

/// Utility rent multiplier when the owner holds one utility.
pub const UTILITY_SINGLE_MULTIPLIER: Money = 4;

/// Utility rent multiplier when the owner holds both utilities.
pub const UTILITY_PAIR_MULTIPLIER: Money = 10;

/// Dice total assumed for utility rent when no live roll is available.
pub const UTILITY_FALLBACK_DICE_TOTAL: Money = 7;

/// House count that represents a hotel.
pub const HOTEL_LEVEL: u8 = 5;

/// Minimum number of players needed to start a game.
pub const MIN_PLAYERS: usize = 2;

/// Maximum number of players in one room.
pub const MAX_PLAYERS: usize = 6;

/// Cost of lifting a mortgage: the mortgage value plus 10% interest, rounded down.
#[must_use]
pub const fn unmortgage_cost(mortgage: Money) -> Money {
    mortgage * 11 / 10
}

/// Refund for selling one house back to the bank: half the build cost, rounded down.
#[must_use]
pub const fn house_sell_value(house_cost: Money) -> Money {
    house_cost / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmortgage_cost_rounds_down() {
        assert_eq!(unmortgage_cost(30), 33);
        assert_eq!(unmortgage_cost(75), 82);
        assert_eq!(unmortgage_cost(175), 192);
    }

    #[test]
    fn test_house_sell_value_is_half() {
        assert_eq!(house_sell_value(50), 25);
        assert_eq!(house_sell_value(150), 75);
    }

    #[test]
    fn test_special_indices_match_table() {
        assert_eq!(TILES[usize::from(JAIL_INDEX)].kind, TileKind::Jail);
        assert_eq!(TILES[usize::from(GO_TO_JAIL_INDEX)].kind, TileKind::GoToJail);
        assert_eq!(TILES[usize::from(GO_INDEX)].kind, TileKind::Go);
        for index in RAILROAD_INDICES {
            assert!(matches!(TILES[usize::from(index)].kind, TileKind::Railroad(_)));
        }
        for index in UTILITY_INDICES {
            assert!(matches!(TILES[usize::from(index)].kind, TileKind::Utility(_)));
        }
    }
}
