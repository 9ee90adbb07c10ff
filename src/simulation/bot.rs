//! Scripted player used by simulations.
//!
//! The bot reads only its own replica, so a stale replica makes it issue
//! stale requests exactly as a lagging human would.

use rand_core::RngCore;

use crate::board::{JAIL_FINE, Money, tile, tiles_in_group, unmortgage_cost};
use crate::error::SessionError;
use crate::game::{
    GameState, PendingAction, Phase, Player, TradeOffer, TradeStatus, TurnPhase, can_build_house,
    can_mortgage, can_sell_house, can_unmortgage, has_monopoly,
};
use crate::session::Session;
use crate::sync::{Submission, Transport};

/// Cash the bot tries to keep in hand.
const RESERVE: Money = 150;

/// One decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Move {
    Roll,
    Buy,
    Auction,
    Bid(Money),
    Pass,
    PayRent,
    PayTax,
    Draw,
    Execute,
    Build(u8),
    Sell(u8),
    Mortgage(u8),
    Unmortgage(u8),
    PayFine,
    UseCard,
    Propose {
        to: String,
        tile_index: u8,
        money: Money,
    },
    Accept(String),
    Reject(String),
    Bankrupt,
    EndTurn,
}

/// Bot tuning.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Policy {
    pub(crate) bid_step: Money,
    pub(crate) trade_percent: u8,
}

/// Pick the next move for `me`, or `None` to wait.
pub(crate) fn decide<R: RngCore + ?Sized>(
    state: &GameState,
    me: &str,
    policy: Policy,
    rng: &mut R,
) -> Option<Move> {
    if state.phase != Phase::Playing {
        return None;
    }
    let player = state.players.get(me).filter(|p| !p.is_bankrupt)?;

    if let Some(PendingAction::Auction {
        tile_index,
        current_bid,
        current_bidder_id,
        participants,
    }) = &state.pending_action
    {
        if !participants.iter().any(|p| p == me) || current_bidder_id.as_deref() == Some(me) {
            return None;
        }
        let value = tile(*tile_index).and_then(|t| t.price()).unwrap_or(0);
        let bid = current_bid + policy.bid_step;
        return Some(if bid <= value && player.money - bid >= RESERVE {
            Move::Bid(bid)
        } else {
            Move::Pass
        });
    }

    if let Some(offer) = state
        .trade_offers
        .iter()
        .find(|t| t.status == TradeStatus::Pending && t.to_player_id == me)
    {
        return Some(answer_trade(state, player, offer));
    }

    if !state.is_current(me) {
        return None;
    }

    match &state.pending_action {
        Some(PendingAction::BuyDecision { price, .. }) => {
            return Some(if player.money - price >= RESERVE {
                Move::Buy
            } else {
                Move::Auction
            });
        }
        Some(PendingAction::PayRent { amount, .. }) => {
            return Some(settle_debt(state, player, *amount, Move::PayRent));
        }
        Some(PendingAction::PayTax { amount }) => {
            return Some(settle_debt(state, player, *amount, Move::PayTax));
        }
        Some(PendingAction::DrawCard { .. }) => return Some(Move::Draw),
        Some(PendingAction::CardAction { .. }) => return Some(Move::Execute),
        Some(PendingAction::Auction { .. }) | None => {}
    }

    if player.money < 0 {
        return Some(raise_funds(state, player).unwrap_or(Move::Bankrupt));
    }

    if !player.has_rolled {
        if player.in_jail {
            if player.get_out_of_jail_cards > 0 {
                return Some(Move::UseCard);
            }
            if player.money >= JAIL_FINE + RESERVE && rng.next_u32() % 2 == 0 {
                return Some(Move::PayFine);
            }
        }
        return Some(Move::Roll);
    }

    if let Some(improvement) = improve(state, player) {
        return Some(improvement);
    }
    let wants_trade = rng.next_u32() % 100 < u32::from(policy.trade_percent);
    if let Some(proposal) = wants_trade.then(|| propose_trade(state, player)).flatten() {
        return Some(proposal);
    }

    let may_reroll =
        state.doubles_count > 0 && state.turn_phase == TurnPhase::PostRoll && !player.in_jail;
    Some(if may_reroll { Move::Roll } else { Move::EndTurn })
}

fn settle_debt(state: &GameState, player: &Player, amount: Money, pay: Move) -> Move {
    if player.money >= amount {
        return pay;
    }
    raise_funds(state, player).unwrap_or(Move::Bankrupt)
}

/// Sell a house, else mortgage a tile.
fn raise_funds(state: &GameState, player: &Player) -> Option<Move> {
    let me = player.id.as_str();
    if let Some(&index) = player
        .properties
        .iter()
        .find(|&&i| can_sell_house(state, me, i))
    {
        return Some(Move::Sell(index));
    }
    player
        .properties
        .iter()
        .find(|&&i| can_mortgage(state, me, i))
        .map(|&i| Move::Mortgage(i))
}

fn improve(state: &GameState, player: &Player) -> Option<Move> {
    let me = player.id.as_str();
    for &index in &player.properties {
        let Some(cost) = tile(index).and_then(|t| t.mortgage()).map(unmortgage_cost) else {
            continue;
        };
        if player.money - cost >= 3 * RESERVE && can_unmortgage(state, me, index) {
            return Some(Move::Unmortgage(index));
        }
    }
    for &index in &player.properties {
        let Some(prop) = tile(index).and_then(|t| t.as_property()) else {
            continue;
        };
        if player.money - prop.house_cost >= 2 * RESERVE && can_build_house(state, me, index) {
            return Some(Move::Build(index));
        }
    }
    None
}

/// Offer cash for a tile that would complete one of our colour groups.
fn propose_trade(state: &GameState, player: &Player) -> Option<Move> {
    let me = player.id.as_str();
    let already_offering = state
        .trade_offers
        .iter()
        .any(|t| t.status == TradeStatus::Pending && t.from_player_id == me);
    if already_offering {
        return None;
    }
    for &mine in &player.properties {
        let Some(group) = tile(mine).and_then(|t| t.as_property()).map(|p| p.group) else {
            continue;
        };
        if has_monopoly(state, me, group) {
            continue;
        }
        for &index in tiles_in_group(group) {
            let Some(owner) = state.owner_of(index).filter(|o| o.as_str() != me) else {
                continue;
            };
            if state.properties.get(&index).is_some_and(|p| p.houses > 0) {
                continue;
            }
            let money = tile(index).and_then(|t| t.price()).unwrap_or(0) * 3 / 2;
            if player.money - money >= 2 * RESERVE {
                return Some(Move::Propose {
                    to: owner.clone(),
                    tile_index: index,
                    money,
                });
            }
        }
    }
    None
}

/// Take cash-for-tile offers worth at least the tile's price, unless the
/// tile belongs to a group we already hold.
fn answer_trade(state: &GameState, player: &Player, offer: &TradeOffer) -> Move {
    let me = player.id.as_str();
    let price_of = |tiles: &[u8]| -> Money {
        tiles
            .iter()
            .filter_map(|&i| tile(i).and_then(|t| t.price()))
            .sum()
    };
    let gives = price_of(&offer.requested_properties) + offer.requested_money;
    let gets = price_of(&offer.offered_properties) + offer.offered_money;
    let breaks_monopoly = offer.requested_properties.iter().any(|&i| {
        tile(i)
            .and_then(|t| t.as_property())
            .is_some_and(|p| has_monopoly(state, me, p.group))
    });
    let affordable = player.money - offer.requested_money >= RESERVE;
    let proposer_can_pay = state
        .players
        .get(&offer.from_player_id)
        .is_some_and(|p| !p.is_bankrupt && p.money >= offer.offered_money);
    let held_by = |tiles: &[u8], owner: &str| {
        tiles.iter().all(|i| {
            state
                .properties
                .get(i)
                .is_some_and(|p| p.owner_id.as_deref() == Some(owner) && p.houses == 0)
        })
    };
    // Mirror the checks the host repeats on acceptance.
    let still_valid = proposer_can_pay
        && held_by(&offer.offered_properties, &offer.from_player_id)
        && held_by(&offer.requested_properties, me);
    if gets >= gives && !breaks_monopoly && affordable && still_valid {
        Move::Accept(offer.id.clone())
    } else {
        Move::Reject(offer.id.clone())
    }
}

/// Carry out a move through the session's intent API.
///
/// A move that needs a pending action which has meanwhile vanished is a
/// no-op.
pub(crate) fn play<T: Transport, R: RngCore + ?Sized>(
    session: &mut Session<T>,
    next: Move,
    rng: &mut R,
) -> Result<Option<Submission>, SessionError> {
    let outcome = match next {
        Move::Roll => session.roll_dice_with(rng),
        Move::Buy => session.buy_property(),
        Move::Auction => session.auction_property(),
        Move::Bid(amount) => session.place_bid(amount),
        Move::Pass => session.pass_auction(),
        Move::PayRent => session.pay_rent(),
        Move::PayTax => session.pay_tax(),
        Move::Draw => session.draw_card(),
        Move::Execute => session.execute_card(),
        Move::Build(index) => session.build_house(index),
        Move::Sell(index) => session.sell_house(index),
        Move::Mortgage(index) => session.mortgage(index),
        Move::Unmortgage(index) => session.unmortgage(index),
        Move::PayFine => session.pay_jail_fine(),
        Move::UseCard => session.use_jail_card(),
        Move::Propose {
            to,
            tile_index,
            money,
        } => session.propose_trade(&to, Vec::new(), money, vec![tile_index], 0),
        Move::Accept(id) => session.accept_trade(&id),
        Move::Reject(id) => session.reject_trade(&id),
        Move::Bankrupt => session.declare_bankruptcy(),
        Move::EndTurn => session.end_turn(),
    };
    match outcome {
        Ok(submission) => Ok(Some(submission)),
        Err(SessionError::NothingPending) => Ok(None),
        Err(e) => Err(e),
    }
}
