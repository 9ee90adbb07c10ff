//! The deterministic state reducer.
//!
//! Every peer runs the same transition function over the same action stream,
//! so the host's authoritative state and each guest replica stay identical.
//!
//! Rules for every handler:
//! - Validate first; return a [`Rejection`] for anything illegal. The caller
//!   works on a clone, so a rejected action never leaks partial mutations.
//! - Never read the clock or an ambient RNG. Randomness arrives inside the
//!   action (dice) or is derived from replicated state (deck reshuffles,
//!   default turn order).

mod bankruptcy;
mod cards;
mod lobby;
mod market;
mod trade;
mod turn;

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Rejection;
use crate::game::{GameAction, GameState, Phase, Player, TurnPhase};

/// Apply an action, stamping `last_update_at` with the wall clock.
///
/// Illegal actions return an unchanged copy of `state`.
#[must_use]
pub fn apply_action(state: &GameState, action: &GameAction) -> GameState {
    apply_action_at(state, action, unix_millis())
}

/// Apply an action at an explicit time (ms since the Unix epoch).
///
/// Illegal actions return an unchanged copy of `state` and are logged at
/// debug level.
#[must_use]
pub fn apply_action_at(state: &GameState, action: &GameAction, now_ms: u64) -> GameState {
    match try_apply_action_at(state, action, now_ms) {
        Ok(next) => next,
        Err(reason) => {
            log::debug!(
                "ignored {} from {}: {reason}",
                action.kind(),
                action.actor().unwrap_or("host")
            );
            state.clone()
        }
    }
}

/// Apply an action at an explicit time, reporting why it was refused.
///
/// # Errors
///
/// Returns the [`Rejection`] describing the first rule the action breaks.
/// The input state is never modified.
pub fn try_apply_action_at(
    state: &GameState,
    action: &GameAction,
    now_ms: u64,
) -> Result<GameState, Rejection> {
    let mut next = state.clone();
    dispatch(&mut next, action)?;
    turn::settle(&mut next);
    next.last_update_at = now_ms;
    Ok(next)
}

fn dispatch(state: &mut GameState, action: &GameAction) -> Result<(), Rejection> {
    match action {
        GameAction::JoinGame {
            player_id,
            player_name,
        } => lobby::join(state, player_id, player_name),
        GameAction::LeaveGame { player_id } => lobby::leave(state, player_id),
        GameAction::SelectToken { player_id, token } => {
            lobby::select_token(state, player_id, *token)
        }
        GameAction::StartGame { turn_order } => lobby::start(state, turn_order),
        GameAction::RollDice {
            player_id,
            result,
            seed,
        } => turn::roll(state, player_id, *result, *seed),
        GameAction::BuyProperty {
            player_id,
            tile_index,
        } => market::buy(state, player_id, *tile_index),
        GameAction::AuctionProperty {
            player_id,
            tile_index,
        } => market::open_auction(state, player_id, *tile_index),
        GameAction::PlaceBid { player_id, amount } => market::bid(state, player_id, *amount),
        GameAction::PassAuction { player_id } => market::pass(state, player_id),
        GameAction::PayRent {
            player_id,
            amount,
            to_player_id,
        } => market::pay_rent(state, player_id, *amount, to_player_id),
        GameAction::PayTax { player_id, amount } => market::pay_tax(state, player_id, *amount),
        GameAction::DrawCard {
            player_id,
            card_type,
        } => cards::draw(state, player_id, *card_type),
        GameAction::ExecuteCard { player_id, card } => cards::execute(state, player_id, card),
        GameAction::BuildHouse {
            player_id,
            tile_index,
        } => market::build_house(state, player_id, *tile_index),
        GameAction::SellHouse {
            player_id,
            tile_index,
        } => market::sell_house(state, player_id, *tile_index),
        GameAction::MortgageProperty {
            player_id,
            tile_index,
        } => market::mortgage(state, player_id, *tile_index),
        GameAction::UnmortgageProperty {
            player_id,
            tile_index,
        } => market::unmortgage(state, player_id, *tile_index),
        GameAction::PayJailFine { player_id } => turn::pay_jail_fine(state, player_id),
        GameAction::UseJailCard { player_id } => turn::use_jail_card(state, player_id),
        GameAction::ProposeTrade { offer } => trade::propose(state, offer),
        GameAction::AcceptTrade {
            player_id,
            trade_id,
        } => trade::accept(state, player_id, trade_id),
        GameAction::RejectTrade {
            player_id,
            trade_id,
        } => trade::reject(state, player_id, trade_id),
        GameAction::CancelTrade {
            player_id,
            trade_id,
        } => trade::cancel(state, player_id, trade_id),
        GameAction::DeclareBankruptcy {
            player_id,
            creditor_id,
        } => bankruptcy::declare(state, player_id, creditor_id.as_deref()),
        GameAction::EndTurn { player_id } => turn::end_turn(state, player_id),
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

// Shared guards.

fn require_phase(state: &GameState, phase: Phase) -> Result<(), Rejection> {
    if state.phase == phase {
        Ok(())
    } else {
        Err(Rejection::WrongPhase)
    }
}

fn require_current(state: &GameState, player_id: &str) -> Result<(), Rejection> {
    if state.is_current(player_id) {
        Ok(())
    } else {
        Err(Rejection::NotYourTurn)
    }
}

fn require_no_pending(state: &GameState) -> Result<(), Rejection> {
    if state.pending_action.is_some() {
        Err(Rejection::PendingActionUnresolved)
    } else {
        Ok(())
    }
}

/// A known, non-bankrupt player.
fn active_player<'a>(state: &'a GameState, player_id: &str) -> Result<&'a Player, Rejection> {
    let player = state
        .players
        .get(player_id)
        .ok_or(Rejection::UnknownPlayer)?;
    if player.is_bankrupt {
        return Err(Rejection::PlayerBankrupt);
    }
    Ok(player)
}

fn player_mut<'a>(state: &'a mut GameState, player_id: &str) -> Result<&'a mut Player, Rejection> {
    state
        .players
        .get_mut(player_id)
        .ok_or(Rejection::UnknownPlayer)
}

/// Derive the turn phase from the pending gate, unless the turn is forced to end.
fn refresh_turn_phase(state: &mut GameState) {
    if state.turn_phase == TurnPhase::EndTurn {
        return;
    }
    state.turn_phase = if state.pending_action.is_some() {
        TurnPhase::Action
    } else {
        TurnPhase::PostRoll
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{DiceRoll, Token};

    /// A started game with players `p0..pn` in seat order, decks seeded with 7.
    pub(super) fn game_with(n: usize) -> GameState {
        let mut state = GameState::new("ROOM01", "p0", 7, 1_000);
        for i in 0..n {
            let id = format!("p{i}");
            state.players.insert(Player::new(id.clone(), id.to_uppercase(), Token::ALL[i]));
            state.turn_order.push(id);
        }
        state.phase = Phase::Playing;
        state
    }

    pub(super) fn act(state: &GameState, action: GameAction) -> GameState {
        try_apply_action_at(state, &action, 2_000).unwrap()
    }

    pub(super) fn refused(state: &GameState, action: GameAction) -> Rejection {
        try_apply_action_at(state, &action, 2_000).unwrap_err()
    }

    /// Roll `a`+`b`. The seed is unique per roll, so repeated faces are not
    /// mistaken for a redelivery.
    pub(super) fn roll(state: &GameState, id: &str, a: u8, b: u8) -> GameState {
        let nth = u32::try_from(state.last_dice_roll_id).unwrap();
        act(
            state,
            GameAction::RollDice {
                player_id: id.into(),
                result: DiceRoll(a, b),
                seed: nth * 100 + u32::from(a) * 10 + u32::from(b),
            },
        )
    }

    pub(super) fn give(state: &mut GameState, id: &str, tiles: &[u8]) {
        for &t in tiles {
            state.properties.get_mut(&t).unwrap().owner_id = Some(id.into());
            state.players.get_mut(id).unwrap().properties.insert(t);
        }
    }

    #[test]
    fn test_rejected_action_returns_input_unchanged() {
        let state = game_with(2);
        let action = GameAction::EndTurn {
            player_id: "p1".into(),
        };
        let next = apply_action_at(&state, &action, 9_999);
        assert_eq!(next, state);
        assert_eq!(refused(&state, action), Rejection::NotYourTurn);
    }

    #[test]
    fn test_accepted_action_stamps_time() {
        let state = game_with(2);
        let next = roll(&state, "p0", 1, 2);
        assert_eq!(next.last_update_at, 2_000);
        assert_eq!(state.last_update_at, 1_000);
    }

    #[test]
    fn test_input_never_mutated() {
        let state = game_with(3);
        let before = state.clone();
        let _ = roll(&state, "p0", 3, 4);
        assert_eq!(state, before);
    }
}
