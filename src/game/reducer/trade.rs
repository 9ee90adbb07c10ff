//! Player-to-player trades.

use super::{player_mut, require_phase};
use crate::error::Rejection;
use crate::game::{GameState, Phase, TradeOffer, TradeStatus};

pub(super) fn propose(state: &mut GameState, offer: &TradeOffer) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    if offer.offered_properties.is_empty()
        && offer.requested_properties.is_empty()
        && offer.offered_money == 0
        && offer.requested_money == 0
    {
        return Err(Rejection::InvalidTrade);
    }
    validate_terms(state, offer, false)?;

    let id = format!("trade-{}", state.trade_seq);
    state.trade_seq += 1;
    log::info!(
        "{} proposed {id} to {}",
        offer.from_player_id,
        offer.to_player_id
    );
    state.trade_offers.push(TradeOffer {
        id,
        status: TradeStatus::Pending,
        ..offer.clone()
    });
    Ok(())
}

/// Check parties, tile ownership, buildings and cash.
///
/// The counterparty's cash is only checked when `accepting`, since it may
/// change before they respond.
fn validate_terms(state: &GameState, offer: &TradeOffer, accepting: bool) -> Result<(), Rejection> {
    let from = state
        .players
        .get(&offer.from_player_id)
        .ok_or(Rejection::UnknownPlayer)?;
    let to = state
        .players
        .get(&offer.to_player_id)
        .ok_or(Rejection::UnknownPlayer)?;
    if from.id == to.id || from.is_bankrupt || to.is_bankrupt {
        return Err(Rejection::InvalidTrade);
    }
    if offer.offered_money < 0 || offer.requested_money < 0 {
        return Err(Rejection::InvalidTrade);
    }
    if offer.offered_money > from.money {
        return Err(Rejection::InsufficientFunds {
            needed: offer.offered_money,
            available: from.money,
        });
    }
    if accepting && offer.requested_money > to.money {
        return Err(Rejection::InsufficientFunds {
            needed: offer.requested_money,
            available: to.money,
        });
    }

    let sides = [
        (&offer.offered_properties, &offer.from_player_id),
        (&offer.requested_properties, &offer.to_player_id),
    ];
    for (tiles, owner) in sides {
        for (n, index) in tiles.iter().enumerate() {
            if tiles[..n].contains(index) {
                return Err(Rejection::InvalidTrade);
            }
            let prop = state
                .properties
                .get(index)
                .ok_or(Rejection::InvalidTile(*index))?;
            if prop.owner_id.as_ref() != Some(owner) {
                return Err(Rejection::NotOwner(*index));
            }
            if prop.houses > 0 {
                return Err(Rejection::InvalidTrade);
            }
        }
    }
    Ok(())
}

fn pending_offer<'a>(state: &'a GameState, trade_id: &str) -> Result<(usize, &'a TradeOffer), Rejection> {
    let (slot, offer) = state
        .trade_offers
        .iter()
        .enumerate()
        .find(|(_, t)| t.id == trade_id)
        .ok_or(Rejection::TradeNotFound)?;
    if offer.status != TradeStatus::Pending {
        return Err(Rejection::TradeNotPending);
    }
    Ok((slot, offer))
}

pub(super) fn accept(state: &mut GameState, player_id: &str, trade_id: &str) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    let (slot, offer) = pending_offer(state, trade_id)?;
    if offer.to_player_id != player_id {
        return Err(Rejection::NotTradeParty);
    }
    validate_terms(state, offer, true)?;
    let offer = offer.clone();

    let from = player_mut(state, &offer.from_player_id)?;
    from.money += offer.requested_money - offer.offered_money;
    for index in &offer.offered_properties {
        from.properties.remove(index);
    }
    from.properties.extend(offer.requested_properties.iter().copied());

    let to = player_mut(state, &offer.to_player_id)?;
    to.money += offer.offered_money - offer.requested_money;
    for index in &offer.requested_properties {
        to.properties.remove(index);
    }
    to.properties.extend(offer.offered_properties.iter().copied());

    for (tiles, owner) in [
        (&offer.offered_properties, &offer.to_player_id),
        (&offer.requested_properties, &offer.from_player_id),
    ] {
        for index in tiles {
            if let Some(prop) = state.properties.get_mut(index) {
                prop.owner_id = Some(owner.clone());
            }
        }
    }

    state.trade_offers[slot].status = TradeStatus::Accepted;
    log::info!("{player_id} accepted {trade_id}");
    Ok(())
}

pub(super) fn reject(state: &mut GameState, player_id: &str, trade_id: &str) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    let (slot, offer) = pending_offer(state, trade_id)?;
    if offer.to_player_id != player_id {
        return Err(Rejection::NotTradeParty);
    }
    state.trade_offers[slot].status = TradeStatus::Rejected;
    Ok(())
}

pub(super) fn cancel(state: &mut GameState, player_id: &str, trade_id: &str) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    let (slot, offer) = pending_offer(state, trade_id)?;
    if offer.from_player_id != player_id {
        return Err(Rejection::NotTradeParty);
    }
    state.trade_offers[slot].status = TradeStatus::Cancelled;
    Ok(())
}
