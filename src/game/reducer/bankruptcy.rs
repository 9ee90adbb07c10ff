//! Bankruptcy, holdings disposal and the win check.

use super::market::resolve_auction;
use super::{active_player, player_mut, refresh_turn_phase, require_phase};
use crate::error::Rejection;
use crate::game::{GameState, PendingAction, Phase, PropertyState, TradeStatus, find_winner};

pub(super) fn declare(
    state: &mut GameState,
    player_id: &str,
    creditor_id: Option<&str>,
) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    active_player(state, player_id)?;
    if let Some(creditor) = creditor_id {
        let valid = creditor != player_id
            && state.players.get(creditor).is_some_and(|p| !p.is_bankrupt);
        if !valid {
            return Err(Rejection::InvalidCreditor);
        }
    }
    let was_current = state.is_current(player_id);

    match creditor_id {
        Some(creditor) => transfer_to_creditor(state, player_id, creditor)?,
        None => release_to_bank(state, player_id)?,
    }
    let player = player_mut(state, player_id)?;
    player.money = 0;
    player.get_out_of_jail_cards = 0;
    player.in_jail = false;
    player.jail_turns = 0;
    player.is_bankrupt = true;
    log::info!(
        "{player_id} declared bankruptcy to {}",
        creditor_id.unwrap_or("the bank")
    );

    drop_from_auction(state, player_id);
    cancel_trades_of(state, player_id);
    if was_current {
        state.pending_action = None;
        state.drawn_card = None;
    } else {
        lapse_rent_owed_to(state, player_id);
    }
    check_winner(state);
    Ok(())
}

/// Clear a pending rent payment whose recipient is leaving the game.
pub(super) fn lapse_rent_owed_to(state: &mut GameState, player_id: &str) {
    if matches!(
        &state.pending_action,
        Some(PendingAction::PayRent { to_player_id, .. }) if to_player_id == player_id
    ) {
        // Nobody left to collect; the debt lapses.
        state.pending_action = None;
        refresh_turn_phase(state);
    }
}

/// Hand cash, tiles (with improvements and mortgages) and jail cards to `creditor`.
fn transfer_to_creditor(
    state: &mut GameState,
    player_id: &str,
    creditor: &str,
) -> Result<(), Rejection> {
    let debtor = player_mut(state, player_id)?;
    let cash = debtor.money.max(0);
    let cards = debtor.get_out_of_jail_cards;
    let tiles = std::mem::take(&mut debtor.properties);

    for index in &tiles {
        if let Some(prop) = state.properties.get_mut(index) {
            prop.owner_id = Some(creditor.to_string());
        }
    }
    let creditor = player_mut(state, creditor)?;
    creditor.money += cash;
    creditor.get_out_of_jail_cards += cards;
    creditor.properties.extend(tiles);
    Ok(())
}

/// Return every tile held by `player_id` to the bank, unimproved and unmortgaged.
pub(super) fn release_to_bank(state: &mut GameState, player_id: &str) -> Result<(), Rejection> {
    let tiles = std::mem::take(&mut player_mut(state, player_id)?.properties);
    for index in tiles {
        if let Some(prop) = state.properties.get_mut(&index) {
            *prop = PropertyState::default();
        }
    }
    Ok(())
}

/// Remove a player from an open auction, resolving it if that decides it.
pub(super) fn drop_from_auction(state: &mut GameState, player_id: &str) {
    if let Some(PendingAction::Auction {
        current_bid,
        current_bidder_id,
        participants,
        ..
    }) = &mut state.pending_action
    {
        participants.retain(|p| p != player_id);
        if current_bidder_id.as_deref() == Some(player_id) {
            *current_bidder_id = None;
            *current_bid = 0;
        }
        resolve_auction(state);
    }
}

/// Cancel every pending trade the player is party to.
pub(super) fn cancel_trades_of(state: &mut GameState, player_id: &str) {
    for offer in &mut state.trade_offers {
        let involved = offer.from_player_id == player_id || offer.to_player_id == player_id;
        if involved && offer.status == TradeStatus::Pending {
            offer.status = TradeStatus::Cancelled;
        }
    }
}

/// Finish the game once a single solvent player remains.
pub(super) fn check_winner(state: &mut GameState) {
    if let Some(winner) = find_winner(state).cloned() {
        log::info!("{winner} wins room {}", state.room_id);
        state.phase = Phase::Finished;
        state.winner_id = Some(winner);
        state.pending_action = None;
        state.drawn_card = None;
    }
}
