//! Pure query helpers.
//!
//! Shared by the reducer (to gate mutations) and by front ends (to decide
//! which actions to offer). Nothing here mutates state.

use crate::board::{
    HOTEL_LEVEL, Money, PropertyGroup, PropertyTile, house_sell_value, tile, tiles_in_group,
    unmortgage_cost,
};
use crate::error::{BuildingRule, Rejection};
use crate::game::{GameState, Player, PlayerId};

/// Whether the player holds at least `amount` in cash.
#[must_use]
pub fn can_afford(player: &Player, amount: Money) -> bool {
    player.money >= amount
}

/// Whether one player owns every tile of a color group.
#[must_use]
pub fn has_monopoly(state: &GameState, player_id: &str, group: PropertyGroup) -> bool {
    tiles_in_group(group)
        .iter()
        .all(|&i| state.owner_of(i).is_some_and(|o| o == player_id))
}

fn group_houses(state: &GameState, group: PropertyGroup) -> impl Iterator<Item = u8> + '_ {
    tiles_in_group(group)
        .iter()
        .map(move |i| state.properties.get(i).map_or(0, |p| p.houses))
}

fn owned_property(
    state: &GameState,
    player_id: &str,
    index: u8,
) -> Result<(&'static PropertyTile, u8, bool), Rejection> {
    let t = tile(index).ok_or(Rejection::InvalidTile(index))?;
    let prop = t
        .as_property()
        .ok_or(Rejection::BuildingRule(BuildingRule::NotBuildable))?;
    let ps = state
        .properties
        .get(&index)
        .ok_or(Rejection::InvalidTile(index))?;
    if ps.owner_id.as_deref() != Some(player_id) {
        return Err(Rejection::NotOwner(index));
    }
    Ok((prop, ps.houses, ps.is_mortgaged))
}

/// Check whether the player may build one house on `index`.
///
/// Requires a monopoly, an unmortgaged tile below hotel level, the house
/// cost in cash, and the even-build rule: a tile may not exceed the lowest
/// tile of its group by more than one.
///
/// # Errors
///
/// Returns the first rule the build would break.
pub fn check_build_house(state: &GameState, player_id: &str, index: u8) -> Result<(), Rejection> {
    let (prop, houses, mortgaged) = owned_property(state, player_id, index)?;
    if mortgaged {
        return Err(Rejection::BuildingRule(BuildingRule::Mortgaged));
    }
    if !has_monopoly(state, player_id, prop.group) {
        return Err(Rejection::BuildingRule(BuildingRule::NoMonopoly));
    }
    if houses >= HOTEL_LEVEL {
        return Err(Rejection::BuildingRule(BuildingRule::AtHotel));
    }
    let player = state.players.get(player_id).ok_or(Rejection::UnknownPlayer)?;
    if !can_afford(player, prop.house_cost) {
        return Err(Rejection::InsufficientFunds {
            needed: prop.house_cost,
            available: player.money,
        });
    }
    let min = group_houses(state, prop.group).min().unwrap_or(0);
    if houses > min {
        return Err(Rejection::BuildingRule(BuildingRule::UnevenBuild));
    }
    Ok(())
}

/// Whether the player may build one house on `index`.
#[must_use]
pub fn can_build_house(state: &GameState, player_id: &str, index: u8) -> bool {
    check_build_house(state, player_id, index).is_ok()
}

/// Check whether the player may sell one house from `index`.
///
/// Selling may not leave the tile below the highest tile of its group.
///
/// # Errors
///
/// Returns the first rule the sale would break.
pub fn check_sell_house(state: &GameState, player_id: &str, index: u8) -> Result<(), Rejection> {
    let (prop, houses, _) = owned_property(state, player_id, index)?;
    if houses == 0 {
        return Err(Rejection::BuildingRule(BuildingRule::NoHouses));
    }
    let max = group_houses(state, prop.group).max().unwrap_or(0);
    if houses < max {
        return Err(Rejection::BuildingRule(BuildingRule::UnevenSale));
    }
    Ok(())
}

/// Whether the player may sell one house from `index`.
#[must_use]
pub fn can_sell_house(state: &GameState, player_id: &str, index: u8) -> bool {
    check_sell_house(state, player_id, index).is_ok()
}

pub(crate) fn check_mortgage(state: &GameState, player_id: &str, index: u8) -> Result<Money, Rejection> {
    let t = tile(index).ok_or(Rejection::InvalidTile(index))?;
    let value = t.mortgage().ok_or(Rejection::InvalidTile(index))?;
    let ps = state
        .properties
        .get(&index)
        .ok_or(Rejection::InvalidTile(index))?;
    if ps.owner_id.as_deref() != Some(player_id) {
        return Err(Rejection::NotOwner(index));
    }
    if ps.is_mortgaged {
        return Err(Rejection::AlreadyMortgaged(index));
    }
    if ps.houses > 0 {
        return Err(Rejection::BuildingRule(BuildingRule::HasBuildings));
    }
    Ok(value)
}

pub(crate) fn check_unmortgage(state: &GameState, player_id: &str, index: u8) -> Result<Money, Rejection> {
    let t = tile(index).ok_or(Rejection::InvalidTile(index))?;
    let value = t.mortgage().ok_or(Rejection::InvalidTile(index))?;
    let ps = state
        .properties
        .get(&index)
        .ok_or(Rejection::InvalidTile(index))?;
    if ps.owner_id.as_deref() != Some(player_id) {
        return Err(Rejection::NotOwner(index));
    }
    if !ps.is_mortgaged {
        return Err(Rejection::NotMortgaged(index));
    }
    let cost = unmortgage_cost(value);
    let player = state.players.get(player_id).ok_or(Rejection::UnknownPlayer)?;
    if !can_afford(player, cost) {
        return Err(Rejection::InsufficientFunds {
            needed: cost,
            available: player.money,
        });
    }
    Ok(cost)
}

/// Whether the player may mortgage `index`.
#[must_use]
pub fn can_mortgage(state: &GameState, player_id: &str, index: u8) -> bool {
    check_mortgage(state, player_id, index).is_ok()
}

/// Whether the player may lift the mortgage on `index`.
#[must_use]
pub fn can_unmortgage(state: &GameState, player_id: &str, index: u8) -> bool {
    check_unmortgage(state, player_id, index).is_ok()
}

/// Liquidation value of a player's holdings.
///
/// Cash, plus the mortgage value of every held tile, plus half the
/// investment in houses on unmortgaged tiles.
#[must_use]
pub fn total_assets(state: &GameState, player_id: &str) -> Money {
    let Some(player) = state.players.get(player_id) else {
        return 0;
    };
    let mut total = player.money;
    for &index in &player.properties {
        let Some(t) = tile(index) else { continue };
        total += t.mortgage().unwrap_or(0);
        if let (Some(prop), Some(ps)) = (t.as_property(), state.properties.get(&index)) {
            if !ps.is_mortgaged {
                total += Money::from(ps.houses) * house_sell_value(prop.house_cost);
            }
        }
    }
    total
}

/// The sole remaining non-bankrupt player, if exactly one is left.
#[must_use]
pub fn find_winner(state: &GameState) -> Option<&PlayerId> {
    let mut active = state.active_players();
    let first = active.next()?;
    if active.next().is_some() {
        return None;
    }
    Some(&first.id)
}
