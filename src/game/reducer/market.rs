//! Buying, auctions, rent and tax, houses and mortgages.

use super::{
    active_player, player_mut, refresh_turn_phase, require_current, require_phase,
};
use crate::board::{Money, house_sell_value, tile};
use crate::error::Rejection;
use crate::game::validation::{check_mortgage, check_unmortgage};
use crate::game::{GameState, PendingAction, Phase, check_build_house, check_sell_house};

pub(super) fn buy(state: &mut GameState, player_id: &str, tile_index: u8) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    require_current(state, player_id)?;
    let player = active_player(state, player_id)?;
    let price = match state.pending_action {
        Some(PendingAction::BuyDecision {
            tile_index: offered,
            price,
        }) if offered == tile_index => price,
        _ => return Err(Rejection::NoMatchingPendingAction),
    };
    if player.money < price {
        return Err(Rejection::InsufficientFunds {
            needed: price,
            available: player.money,
        });
    }

    grant_tile(state, player_id, tile_index, price)?;
    log::info!("{player_id} bought tile {tile_index} for {price}");
    state.pending_action = None;
    refresh_turn_phase(state);
    Ok(())
}

/// Charge `price` and record `player_id` as the owner of `tile_index`.
fn grant_tile(
    state: &mut GameState,
    player_id: &str,
    tile_index: u8,
    price: Money,
) -> Result<(), Rejection> {
    let prop = state
        .properties
        .get_mut(&tile_index)
        .ok_or(Rejection::InvalidTile(tile_index))?;
    prop.owner_id = Some(player_id.to_string());
    let player = player_mut(state, player_id)?;
    player.money -= price;
    player.properties.insert(tile_index);
    Ok(())
}

pub(super) fn open_auction(
    state: &mut GameState,
    player_id: &str,
    tile_index: u8,
) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    require_current(state, player_id)?;
    active_player(state, player_id)?;
    match state.pending_action {
        Some(PendingAction::BuyDecision {
            tile_index: offered,
            ..
        }) if offered == tile_index => {}
        _ => return Err(Rejection::NoMatchingPendingAction),
    }

    let participants = state
        .turn_order
        .iter()
        .filter(|id| state.players.get(id).is_some_and(|p| !p.is_bankrupt))
        .cloned()
        .collect();
    state.pending_action = Some(PendingAction::Auction {
        tile_index,
        current_bid: 0,
        current_bidder_id: None,
        participants,
    });
    log::info!("{player_id} declined tile {tile_index}; auction opened");
    refresh_turn_phase(state);
    Ok(())
}

pub(super) fn bid(state: &mut GameState, player_id: &str, amount: Money) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    let money = active_player(state, player_id)?.money;
    let Some(PendingAction::Auction {
        current_bid,
        current_bidder_id,
        participants,
        ..
    }) = &mut state.pending_action
    else {
        return Err(Rejection::NoMatchingPendingAction);
    };
    if !participants.iter().any(|p| p == player_id) {
        return Err(Rejection::NotParticipant);
    }
    if amount <= *current_bid {
        return Err(Rejection::BidTooLow {
            current: *current_bid,
        });
    }
    if amount > money {
        return Err(Rejection::InsufficientFunds {
            needed: amount,
            available: money,
        });
    }
    *current_bid = amount;
    *current_bidder_id = Some(player_id.to_string());
    resolve_auction(state);
    Ok(())
}

pub(super) fn pass(state: &mut GameState, player_id: &str) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    let Some(PendingAction::Auction {
        current_bidder_id,
        participants,
        ..
    }) = &mut state.pending_action
    else {
        return Err(Rejection::NoMatchingPendingAction);
    };
    let Some(seat) = participants.iter().position(|p| p == player_id) else {
        return Err(Rejection::NotParticipant);
    };
    if current_bidder_id.as_deref() == Some(player_id) {
        return Err(Rejection::HighBidderCannotPass);
    }
    participants.remove(seat);
    resolve_auction(state);
    Ok(())
}

/// Close the auction once it is decided.
///
/// Awards the tile when the high bidder is the only participant left, and
/// cancels without a sale when everyone passed without bidding.
pub(super) fn resolve_auction(state: &mut GameState) {
    let Some(PendingAction::Auction {
        tile_index,
        current_bid,
        current_bidder_id,
        participants,
    }) = &state.pending_action
    else {
        return;
    };
    let tile_index = *tile_index;

    if participants.is_empty() {
        log::info!("auction for tile {tile_index} closed without a sale");
    } else if participants.len() == 1 && current_bidder_id.as_ref() == participants.first() {
        let price = *current_bid;
        let winner = participants[0].clone();
        let solvent = state.players.get(&winner).is_some_and(|p| p.money >= price);
        if solvent && grant_tile(state, &winner, tile_index, price).is_ok() {
            log::info!("{winner} won tile {tile_index} at auction for {price}");
        } else {
            log::info!("auction winner {winner} cannot pay {price}; no sale");
        }
    } else {
        return;
    }

    state.pending_action = None;
    refresh_turn_phase(state);
}

pub(super) fn pay_rent(
    state: &mut GameState,
    player_id: &str,
    amount: Money,
    to_player_id: &str,
) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    require_current(state, player_id)?;
    let player = active_player(state, player_id)?;
    let due = match &state.pending_action {
        Some(PendingAction::PayRent {
            amount,
            to_player_id: owner,
        }) if owner == to_player_id => *amount,
        _ => return Err(Rejection::NoMatchingPendingAction),
    };
    if amount != due {
        return Err(Rejection::AmountMismatch { expected: due });
    }
    if player.money < due {
        return Err(Rejection::InsufficientFunds {
            needed: due,
            available: player.money,
        });
    }
    player_mut(state, to_player_id)?.money += due;
    player_mut(state, player_id)?.money -= due;
    state.pending_action = None;
    refresh_turn_phase(state);
    Ok(())
}

pub(super) fn pay_tax(state: &mut GameState, player_id: &str, amount: Money) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    require_current(state, player_id)?;
    let player = active_player(state, player_id)?;
    let Some(PendingAction::PayTax { amount: due }) = state.pending_action else {
        return Err(Rejection::NoMatchingPendingAction);
    };
    if amount != due {
        return Err(Rejection::AmountMismatch { expected: due });
    }
    if player.money < due {
        return Err(Rejection::InsufficientFunds {
            needed: due,
            available: player.money,
        });
    }
    player_mut(state, player_id)?.money -= due;
    state.free_parking += due;
    state.pending_action = None;
    refresh_turn_phase(state);
    Ok(())
}

pub(super) fn build_house(
    state: &mut GameState,
    player_id: &str,
    tile_index: u8,
) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    active_player(state, player_id)?;
    check_build_house(state, player_id, tile_index)?;
    let cost = house_cost(tile_index)?;
    player_mut(state, player_id)?.money -= cost;
    if let Some(prop) = state.properties.get_mut(&tile_index) {
        prop.houses += 1;
    }
    Ok(())
}

pub(super) fn sell_house(
    state: &mut GameState,
    player_id: &str,
    tile_index: u8,
) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    active_player(state, player_id)?;
    check_sell_house(state, player_id, tile_index)?;
    let refund = house_sell_value(house_cost(tile_index)?);
    player_mut(state, player_id)?.money += refund;
    if let Some(prop) = state.properties.get_mut(&tile_index) {
        prop.houses -= 1;
    }
    Ok(())
}

fn house_cost(tile_index: u8) -> Result<Money, Rejection> {
    tile(tile_index)
        .and_then(|t| t.as_property())
        .map(|p| p.house_cost)
        .ok_or(Rejection::InvalidTile(tile_index))
}

pub(super) fn mortgage(
    state: &mut GameState,
    player_id: &str,
    tile_index: u8,
) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    active_player(state, player_id)?;
    let value = check_mortgage(state, player_id, tile_index)?;
    player_mut(state, player_id)?.money += value;
    if let Some(prop) = state.properties.get_mut(&tile_index) {
        prop.is_mortgaged = true;
    }
    Ok(())
}

pub(super) fn unmortgage(
    state: &mut GameState,
    player_id: &str,
    tile_index: u8,
) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    active_player(state, player_id)?;
    let cost = check_unmortgage(state, player_id, tile_index)?;
    player_mut(state, player_id)?.money -= cost;
    if let Some(prop) = state.properties.get_mut(&tile_index) {
        prop.is_mortgaged = false;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests::{act, game_with, give, refused, roll};
    use super::*;
    use crate::game::{GameAction, TurnPhase};

    fn bid_action(id: &str, amount: Money) -> GameAction {
        GameAction::PlaceBid {
            player_id: id.into(),
            amount,
        }
    }

    fn pass_action(id: &str) -> GameAction {
        GameAction::PassAuction {
            player_id: id.into(),
        }
    }

    /// p0 lands on tile 3 (price 60) and declines it.
    fn auction_game(n: usize) -> GameState {
        let state = roll(&game_with(n), "p0", 1, 2);
        act(
            &state,
            GameAction::AuctionProperty {
                player_id: "p0".into(),
                tile_index: 3,
            },
        )
    }

    #[test]
    fn test_buy_property() {
        let state = roll(&game_with(2), "p0", 1, 2);
        let state = act(
            &state,
            GameAction::BuyProperty {
                player_id: "p0".into(),
                tile_index: 3,
            },
        );
        let p0 = state.players.get("p0").unwrap();
        assert_eq!(p0.money, 1440);
        assert!(p0.owns(3));
        assert_eq!(state.owner_of(3).map(String::as_str), Some("p0"));
        assert!(state.pending_action.is_none());
        assert_eq!(state.turn_phase, TurnPhase::PostRoll);
    }

    #[test]
    fn test_buy_requires_matching_offer_and_funds() {
        let mut state = roll(&game_with(2), "p0", 1, 2);
        let wrong_tile = GameAction::BuyProperty {
            player_id: "p0".into(),
            tile_index: 1,
        };
        assert_eq!(
            refused(&state, wrong_tile),
            Rejection::NoMatchingPendingAction
        );
        state.players.get_mut("p0").unwrap().money = 59;
        let buy = GameAction::BuyProperty {
            player_id: "p0".into(),
            tile_index: 3,
        };
        assert!(matches!(
            refused(&state, buy),
            Rejection::InsufficientFunds { needed: 60, .. }
        ));
    }

    #[test]
    fn test_auction_lists_active_players_in_turn_order() {
        let mut state = roll(&game_with(3), "p0", 1, 2);
        state.players.get_mut("p1").unwrap().is_bankrupt = true;
        let state = act(
            &state,
            GameAction::AuctionProperty {
                player_id: "p0".into(),
                tile_index: 3,
            },
        );
        let Some(PendingAction::Auction { participants, .. }) = &state.pending_action else {
            panic!("expected auction");
        };
        assert_eq!(participants, &vec!["p0".to_string(), "p2".to_string()]);
        assert_eq!(state.turn_phase, TurnPhase::Action);
    }

    #[test]
    fn test_auction_awarded_to_last_bidder_standing() {
        let state = auction_game(3);
        let state = act(&state, bid_action("p0", 10));
        let state = act(&state, bid_action("p1", 20));
        let state = act(&state, pass_action("p2"));
        let state = act(&state, pass_action("p0"));
        assert!(state.pending_action.is_none());
        assert_eq!(state.owner_of(3).map(String::as_str), Some("p1"));
        assert_eq!(state.players.get("p1").unwrap().money, 1480);
        assert!(state.players.get("p1").unwrap().owns(3));
        assert_eq!(state.turn_phase, TurnPhase::PostRoll);
    }

    #[test]
    fn test_bid_must_exceed_current() {
        let state = act(&auction_game(2), bid_action("p1", 30));
        assert_eq!(
            refused(&state, bid_action("p0", 30)),
            Rejection::BidTooLow { current: 30 }
        );
        assert!(matches!(
            refused(&state, bid_action("p0", 5000)),
            Rejection::InsufficientFunds { .. }
        ));
    }

    #[test]
    fn test_high_bidder_cannot_pass() {
        let state = act(&auction_game(2), bid_action("p1", 30));
        assert_eq!(
            refused(&state, pass_action("p1")),
            Rejection::HighBidderCannotPass
        );
    }

    #[test]
    fn test_auction_cancelled_when_everyone_passes() {
        let state = auction_game(2);
        let state = act(&state, pass_action("p0"));
        assert!(matches!(state.pending_action, Some(PendingAction::Auction { .. })));
        let state = act(&state, pass_action("p1"));
        assert!(state.pending_action.is_none());
        assert!(state.owner_of(3).is_none());
        assert_eq!(state.turn_phase, TurnPhase::PostRoll);
    }

    #[test]
    fn test_passer_cannot_rejoin() {
        let state = act(&auction_game(3), pass_action("p2"));
        assert_eq!(
            refused(&state, bid_action("p2", 10)),
            Rejection::NotParticipant
        );
    }

    #[test]
    fn test_pay_rent_transfers_exact_amount() {
        let mut state = game_with(2);
        give(&mut state, "p1", &[6]);
        let state = roll(&state, "p0", 2, 4);
        let short = GameAction::PayRent {
            player_id: "p0".into(),
            amount: 5,
            to_player_id: "p1".into(),
        };
        assert_eq!(
            refused(&state, short),
            Rejection::AmountMismatch { expected: 6 }
        );
        let state = act(
            &state,
            GameAction::PayRent {
                player_id: "p0".into(),
                amount: 6,
                to_player_id: "p1".into(),
            },
        );
        assert_eq!(state.players.get("p0").unwrap().money, 1494);
        assert_eq!(state.players.get("p1").unwrap().money, 1506);
        assert_eq!(state.turn_phase, TurnPhase::PostRoll);
    }

    #[test]
    fn test_pay_tax_feeds_pot() {
        let state = roll(&game_with(2), "p0", 1, 3);
        let Some(PendingAction::PayTax { amount }) = state.pending_action else {
            panic!("expected tax");
        };
        let state = act(
            &state,
            GameAction::PayTax {
                player_id: "p0".into(),
                amount,
            },
        );
        assert_eq!(state.free_parking, amount);
        assert_eq!(state.players.get("p0").unwrap().money, 1500 - amount);
    }

    #[test]
    fn test_build_and_sell_house() {
        let mut state = game_with(2);
        give(&mut state, "p1", &[1, 3]);
        // Building is allowed outside the owner's turn.
        let state = act(
            &state,
            GameAction::BuildHouse {
                player_id: "p1".into(),
                tile_index: 1,
            },
        );
        assert_eq!(state.properties[&1].houses, 1);
        assert_eq!(state.players.get("p1").unwrap().money, 1450);
        let uneven = GameAction::BuildHouse {
            player_id: "p1".into(),
            tile_index: 1,
        };
        assert!(matches!(refused(&state, uneven), Rejection::BuildingRule(_)));
        let state = act(
            &state,
            GameAction::SellHouse {
                player_id: "p1".into(),
                tile_index: 1,
            },
        );
        assert_eq!(state.properties[&1].houses, 0);
        assert_eq!(state.players.get("p1").unwrap().money, 1475);
    }

    #[test]
    fn test_mortgage_and_unmortgage() {
        let mut state = game_with(2);
        give(&mut state, "p0", &[39]);
        let state = act(
            &state,
            GameAction::MortgageProperty {
                player_id: "p0".into(),
                tile_index: 39,
            },
        );
        assert!(state.properties[&39].is_mortgaged);
        assert_eq!(state.players.get("p0").unwrap().money, 1700);
        let state = act(
            &state,
            GameAction::UnmortgageProperty {
                player_id: "p0".into(),
                tile_index: 39,
            },
        );
        assert!(!state.properties[&39].is_mortgaged);
        assert_eq!(state.players.get("p0").unwrap().money, 1480);
    }
}
