//! Rolling, movement, landing, jail and turn hand-over.

use super::{
    active_player, player_mut, refresh_turn_phase, require_current, require_no_pending,
    require_phase,
};
use crate::board::{
    DeckKind, GO_SALARY, JAIL_FINE, JAIL_INDEX, MAX_DOUBLES, MAX_JAIL_TURNS, TileKind, tile,
};
use crate::error::Rejection;
use crate::game::{
    DiceRoll, GameState, PendingAction, Phase, TradeStatus, TurnPhase, calculate_rent,
    move_forward,
};

pub(super) fn roll(
    state: &mut GameState,
    player_id: &str,
    result: DiceRoll,
    seed: u32,
) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    require_current(state, player_id)?;
    let player = active_player(state, player_id)?;
    require_no_pending(state)?;
    if !result.is_valid() {
        return Err(Rejection::InvalidDice);
    }
    if player.has_rolled {
        // A redelivered roll carries the same faces and the same animation seed.
        if state.current_dice_roll == Some(result) && state.last_dice_roll_seed == Some(seed) {
            return Err(Rejection::DuplicateRoll);
        }
        let rerolls = state.doubles_count > 0
            && state.turn_phase == TurnPhase::PostRoll
            && !player.in_jail;
        if !rerolls {
            return Err(Rejection::AlreadyRolled);
        }
    }
    let in_jail = player.in_jail;

    state.current_dice_roll = Some(result);
    state.last_dice_roll_id += 1;
    state.last_dice_roll_seed = Some(seed);

    if in_jail {
        roll_in_jail(state, player_id, result)
    } else {
        roll_free(state, player_id, result)
    }
}

fn roll_free(state: &mut GameState, player_id: &str, result: DiceRoll) -> Result<(), Rejection> {
    if result.is_doubles() {
        state.doubles_count += 1;
        if state.doubles_count >= MAX_DOUBLES {
            log::info!("{player_id} rolled {MAX_DOUBLES} doubles in a row and goes to jail");
            return send_to_jail(state, player_id);
        }
    } else {
        state.doubles_count = 0;
    }
    advance(state, player_id, result.total())
}

fn roll_in_jail(state: &mut GameState, player_id: &str, result: DiceRoll) -> Result<(), Rejection> {
    state.doubles_count = 0;
    let player = player_mut(state, player_id)?;
    if result.is_doubles() {
        player.in_jail = false;
        player.jail_turns = 0;
        return advance(state, player_id, result.total());
    }

    player.jail_turns += 1;
    if player.jail_turns < MAX_JAIL_TURNS {
        player.has_rolled = true;
        state.turn_phase = TurnPhase::EndTurn;
        return Ok(());
    }

    // Third miss: the fine is charged even if it overdraws the player.
    player.money -= JAIL_FINE;
    player.in_jail = false;
    player.jail_turns = 0;
    state.free_parking += JAIL_FINE;
    advance(state, player_id, result.total())
}

/// Move forward by a dice total, collect salary for passing GO and resolve the tile.
fn advance(state: &mut GameState, player_id: &str, spaces: u8) -> Result<(), Rejection> {
    let player = player_mut(state, player_id)?;
    let step = move_forward(player.position, spaces);
    player.position = step.position;
    player.has_rolled = true;
    if step.passed_go {
        player.money += GO_SALARY;
    }
    state.turn_phase = TurnPhase::PostRoll;
    land(state, player_id)?;
    refresh_turn_phase(state);
    Ok(())
}

/// Resolve the tile the player stands on.
pub(super) fn land(state: &mut GameState, player_id: &str) -> Result<(), Rejection> {
    let position = player_mut(state, player_id)?.position;
    let landed = tile(position).ok_or(Rejection::InvalidTile(position))?;

    match landed.kind {
        TileKind::Property(_) | TileKind::Railroad(_) | TileKind::Utility(_) => {
            let Some(prop) = state.properties.get(&position) else {
                return Err(Rejection::InvalidTile(position));
            };
            match prop.owner_id.as_deref() {
                None => {
                    state.pending_action = Some(PendingAction::BuyDecision {
                        tile_index: position,
                        price: landed.price().unwrap_or(0),
                    });
                }
                Some(owner) if owner != player_id && !prop.is_mortgaged => {
                    let to_player_id = owner.to_string();
                    let amount = calculate_rent(state, position, state.current_dice_roll);
                    if amount > 0 {
                        state.pending_action = Some(PendingAction::PayRent {
                            amount,
                            to_player_id,
                        });
                    }
                }
                Some(_) => {}
            }
        }
        TileKind::Chance => {
            state.pending_action = Some(PendingAction::DrawCard {
                card_type: DeckKind::Chance,
            });
        }
        TileKind::CommunityChest => {
            state.pending_action = Some(PendingAction::DrawCard {
                card_type: DeckKind::CommunityChest,
            });
        }
        TileKind::Tax { amount } => {
            state.pending_action = Some(PendingAction::PayTax { amount });
        }
        TileKind::GoToJail => send_to_jail(state, player_id)?,
        TileKind::FreeParking => {
            if state.free_parking > 0 {
                let pot = std::mem::take(&mut state.free_parking);
                player_mut(state, player_id)?.money += pot;
                log::info!("{player_id} collects the free parking pot of {pot}");
            }
        }
        TileKind::Go | TileKind::Jail => {}
    }
    Ok(())
}

/// Teleport to jail without salary; the turn can only end afterwards.
pub(super) fn send_to_jail(state: &mut GameState, player_id: &str) -> Result<(), Rejection> {
    let player = player_mut(state, player_id)?;
    player.position = JAIL_INDEX;
    player.in_jail = true;
    player.jail_turns = 0;
    player.has_rolled = true;
    state.doubles_count = 0;
    state.turn_phase = TurnPhase::EndTurn;
    Ok(())
}

pub(super) fn end_turn(state: &mut GameState, player_id: &str) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    require_current(state, player_id)?;
    let player = active_player(state, player_id)?;
    require_no_pending(state)?;
    if !player.has_rolled {
        return Err(Rejection::MustRollFirst);
    }
    if player.money < 0 {
        return Err(Rejection::OutstandingDebt);
    }
    advance_turn(state);
    Ok(())
}

/// Hand the turn to the next non-bankrupt player and reset per-turn state.
pub(super) fn advance_turn(state: &mut GameState) {
    if let Some(id) = state.current_player_id().cloned() {
        if let Some(p) = state.players.get_mut(&id) {
            p.has_rolled = false;
        }
    }
    state.current_player_index = state.next_player_index();
    if let Some(id) = state.current_player_id().cloned() {
        if let Some(p) = state.players.get_mut(&id) {
            p.has_rolled = false;
        }
    }
    state.turn_phase = TurnPhase::PreRoll;
    state.current_dice_roll = None;
    state.doubles_count = 0;
    state.pending_action = None;
    state.drawn_card = None;
    state.trade_offers.retain(|t| t.status == TradeStatus::Pending);
}

pub(super) fn pay_jail_fine(state: &mut GameState, player_id: &str) -> Result<(), Rejection> {
    let player = jailed_before_roll(state, player_id)?;
    if player.money < JAIL_FINE {
        return Err(Rejection::InsufficientFunds {
            needed: JAIL_FINE,
            available: player.money,
        });
    }
    let player = player_mut(state, player_id)?;
    player.money -= JAIL_FINE;
    player.in_jail = false;
    player.jail_turns = 0;
    state.free_parking += JAIL_FINE;
    Ok(())
}

pub(super) fn use_jail_card(state: &mut GameState, player_id: &str) -> Result<(), Rejection> {
    let player = jailed_before_roll(state, player_id)?;
    if player.get_out_of_jail_cards == 0 {
        return Err(Rejection::NoJailCard);
    }
    let player = player_mut(state, player_id)?;
    player.get_out_of_jail_cards -= 1;
    player.in_jail = false;
    player.jail_turns = 0;
    Ok(())
}

fn jailed_before_roll<'a>(
    state: &'a GameState,
    player_id: &str,
) -> Result<&'a crate::game::Player, Rejection> {
    require_phase(state, Phase::Playing)?;
    require_current(state, player_id)?;
    let player = active_player(state, player_id)?;
    if !player.in_jail {
        return Err(Rejection::NotInJail);
    }
    if player.has_rolled {
        return Err(Rejection::AlreadyRolled);
    }
    Ok(player)
}

/// Skip past a bankrupt current player. Runs after every accepted action.
pub(super) fn settle(state: &mut GameState) {
    if state.phase != Phase::Playing {
        return;
    }
    for _ in 0..state.turn_order.len() {
        match state.current_player() {
            Some(p) if p.is_bankrupt => advance_turn(state),
            _ => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{act, game_with, give, refused, roll};
    use super::*;
    use crate::game::GameAction;

    fn end(state: &GameState, id: &str) -> GameState {
        act(
            state,
            GameAction::EndTurn {
                player_id: id.into(),
            },
        )
    }

    #[test]
    fn test_non_current_player_cannot_roll() {
        let state = game_with(3);
        let reason = refused(
            &state,
            GameAction::RollDice {
                player_id: "p1".into(),
                result: DiceRoll(1, 2),
                seed: 1,
            },
        );
        assert_eq!(reason, Rejection::NotYourTurn);
    }

    #[test]
    fn test_roll_moves_and_offers_purchase() {
        let state = roll(&game_with(2), "p0", 1, 2);
        let p0 = state.players.get("p0").unwrap();
        assert_eq!(p0.position, 3);
        assert!(p0.has_rolled);
        assert_eq!(state.last_dice_roll_id, 1);
        assert_eq!(state.turn_phase, TurnPhase::Action);
        assert_eq!(
            state.pending_action,
            Some(PendingAction::BuyDecision {
                tile_index: 3,
                price: 60
            })
        );
    }

    #[test]
    fn test_duplicate_roll_ignored() {
        let state = roll(&game_with(2), "p0", 3, 4);
        let mut quiet = state.clone();
        quiet.pending_action = None;
        quiet.turn_phase = TurnPhase::PostRoll;
        let again = GameAction::RollDice {
            player_id: "p0".into(),
            result: DiceRoll(3, 4),
            seed: 34,
        };
        assert_eq!(refused(&quiet, again), Rejection::DuplicateRoll);
    }

    #[test]
    fn test_second_roll_without_doubles_refused() {
        let mut state = roll(&game_with(2), "p0", 3, 4);
        state.pending_action = None;
        state.turn_phase = TurnPhase::PostRoll;
        let again = GameAction::RollDice {
            player_id: "p0".into(),
            result: DiceRoll(1, 2),
            seed: 5,
        };
        assert_eq!(refused(&state, again), Rejection::AlreadyRolled);
    }

    #[test]
    fn test_doubles_grant_another_roll() {
        // 2+2 lands on tax; clear it to reach post-roll.
        let mut state = roll(&game_with(2), "p0", 2, 2);
        assert_eq!(state.doubles_count, 1);
        state.pending_action = None;
        state.turn_phase = TurnPhase::PostRoll;
        let state = roll(&state, "p0", 1, 2);
        assert_eq!(state.players.get("p0").unwrap().position, 7);
        assert_eq!(state.doubles_count, 0);
    }

    #[test]
    fn test_three_doubles_send_to_jail() {
        // Each roll lands on a card or tax tile; clear the gate between rolls.
        let mut state = roll(&game_with(2), "p0", 1, 1);
        state.pending_action = None;
        state.turn_phase = TurnPhase::PostRoll;
        let mut state = roll(&state, "p0", 1, 1);
        state.pending_action = None;
        state.turn_phase = TurnPhase::PostRoll;
        let state = roll(&state, "p0", 1, 1);
        let p0 = state.players.get("p0").unwrap();
        assert!(p0.in_jail);
        assert_eq!(p0.position, JAIL_INDEX);
        assert_eq!(state.doubles_count, 0);
        assert_eq!(state.turn_phase, TurnPhase::EndTurn);
        // No fourth roll.
        let fourth = GameAction::RollDice {
            player_id: "p0".into(),
            result: DiceRoll(2, 2),
            seed: 9,
        };
        assert_eq!(refused(&state, fourth), Rejection::AlreadyRolled);
    }

    #[test]
    fn test_passing_go_pays_salary() {
        let mut state = game_with(2);
        state.players.get_mut("p0").unwrap().position = 38;
        let state = roll(&state, "p0", 2, 3);
        let p0 = state.players.get("p0").unwrap();
        assert_eq!(p0.position, 3);
        assert_eq!(p0.money, 1500 + GO_SALARY);
    }

    #[test]
    fn test_landing_on_go_to_jail() {
        let mut state = game_with(2);
        state.players.get_mut("p0").unwrap().position = 25;
        let state = roll(&state, "p0", 2, 3);
        let p0 = state.players.get("p0").unwrap();
        assert!(p0.in_jail);
        assert_eq!(p0.position, JAIL_INDEX);
        assert_eq!(p0.money, 1500);
        assert_eq!(state.turn_phase, TurnPhase::EndTurn);
        assert!(state.pending_action.is_none());
    }

    #[test]
    fn test_landing_on_owned_tile_charges_rent() {
        let mut state = game_with(2);
        give(&mut state, "p1", &[6]);
        let state = roll(&state, "p0", 2, 4);
        assert_eq!(
            state.pending_action,
            Some(PendingAction::PayRent {
                amount: 6,
                to_player_id: "p1".into()
            })
        );
    }

    #[test]
    fn test_free_parking_pays_out_pot() {
        let mut state = game_with(2);
        state.free_parking = 150;
        state.players.get_mut("p0").unwrap().position = 15;
        let state = roll(&state, "p0", 2, 3);
        assert_eq!(state.free_parking, 0);
        assert_eq!(state.players.get("p0").unwrap().money, 1650);
        assert_eq!(state.turn_phase, TurnPhase::PostRoll);
    }

    #[test]
    fn test_jail_doubles_free_without_extra_roll() {
        let mut state = game_with(2);
        {
            let p0 = state.players.get_mut("p0").unwrap();
            p0.in_jail = true;
            p0.position = JAIL_INDEX;
        }
        give(&mut state, "p0", &[14]);
        let state = roll(&state, "p0", 2, 2);
        let p0 = state.players.get("p0").unwrap();
        assert!(!p0.in_jail);
        assert_eq!(p0.position, 14);
        assert_eq!(state.doubles_count, 0);
    }

    #[test]
    fn test_third_failed_jail_roll_charges_fine() {
        let mut state = game_with(2);
        {
            let p0 = state.players.get_mut("p0").unwrap();
            p0.in_jail = true;
            p0.jail_turns = 2;
            p0.position = JAIL_INDEX;
        }
        let state = roll(&state, "p0", 1, 2);
        let p0 = state.players.get("p0").unwrap();
        assert!(!p0.in_jail);
        assert_eq!(p0.money, 1500 - JAIL_FINE);
        assert_eq!(p0.position, 13);
        assert_eq!(state.free_parking, JAIL_FINE);
    }

    #[test]
    fn test_failed_jail_roll_ends_turn() {
        let mut state = game_with(2);
        state.players.get_mut("p0").unwrap().in_jail = true;
        state.players.get_mut("p0").unwrap().position = JAIL_INDEX;
        let state = roll(&state, "p0", 1, 2);
        let p0 = state.players.get("p0").unwrap();
        assert!(p0.in_jail);
        assert_eq!(p0.jail_turns, 1);
        assert_eq!(state.turn_phase, TurnPhase::EndTurn);
        let state = end(&state, "p0");
        assert!(state.is_current("p1"));
    }

    #[test]
    fn test_end_turn_requires_roll_and_clear_gate() {
        let state = game_with(2);
        let end_turn = GameAction::EndTurn {
            player_id: "p0".into(),
        };
        assert_eq!(refused(&state, end_turn.clone()), Rejection::MustRollFirst);
        let state = roll(&state, "p0", 1, 2);
        assert_eq!(
            refused(&state, end_turn),
            Rejection::PendingActionUnresolved
        );
    }

    #[test]
    fn test_end_turn_blocked_by_debt() {
        let mut state = game_with(2);
        give(&mut state, "p0", &[3]);
        let mut state = roll(&state, "p0", 1, 2);
        state.players.get_mut("p0").unwrap().money = -10;
        let reason = refused(
            &state,
            GameAction::EndTurn {
                player_id: "p0".into(),
            },
        );
        assert_eq!(reason, Rejection::OutstandingDebt);
    }

    #[test]
    fn test_end_turn_advances_and_resets() {
        let mut state = game_with(3);
        give(&mut state, "p0", &[3]);
        let state = roll(&state, "p0", 1, 2);
        let state = end(&state, "p0");
        assert!(state.is_current("p1"));
        assert_eq!(state.turn_phase, TurnPhase::PreRoll);
        assert!(state.current_dice_roll.is_none());
        assert!(!state.players.get("p0").unwrap().has_rolled);
    }

    #[test]
    fn test_end_turn_skips_bankrupt() {
        let mut state = game_with(3);
        give(&mut state, "p0", &[3]);
        state.players.get_mut("p1").unwrap().is_bankrupt = true;
        let state = roll(&state, "p0", 1, 2);
        let state = end(&state, "p0");
        assert!(state.is_current("p2"));
    }

    #[test]
    fn test_pay_jail_fine_before_roll() {
        let mut state = game_with(2);
        state.players.get_mut("p0").unwrap().in_jail = true;
        let state = act(
            &state,
            GameAction::PayJailFine {
                player_id: "p0".into(),
            },
        );
        let p0 = state.players.get("p0").unwrap();
        assert!(!p0.in_jail);
        assert_eq!(p0.money, 1450);
        assert_eq!(state.free_parking, 50);
    }

    #[test]
    fn test_use_jail_card() {
        let mut state = game_with(2);
        let no_card = GameAction::UseJailCard {
            player_id: "p0".into(),
        };
        assert_eq!(refused(&state, no_card.clone()), Rejection::NotInJail);
        state.players.get_mut("p0").unwrap().in_jail = true;
        assert_eq!(refused(&state, no_card.clone()), Rejection::NoJailCard);
        state.players.get_mut("p0").unwrap().get_out_of_jail_cards = 1;
        let state = act(&state, no_card);
        let p0 = state.players.get("p0").unwrap();
        assert!(!p0.in_jail);
        assert_eq!(p0.get_out_of_jail_cards, 0);
    }

    #[test]
    fn test_trades_pruned_at_turn_end() {
        use crate::game::TradeOffer;
        let mut state = game_with(2);
        give(&mut state, "p0", &[3]);
        for (i, status) in [TradeStatus::Pending, TradeStatus::Rejected].into_iter().enumerate() {
            state.trade_offers.push(TradeOffer {
                id: format!("trade-{i}"),
                from_player_id: "p0".into(),
                to_player_id: "p1".into(),
                offered_properties: vec![],
                offered_money: 10,
                requested_properties: vec![],
                requested_money: 0,
                status,
            });
        }
        let state = end(&roll(&state, "p0", 1, 2), "p0");
        assert_eq!(state.trade_offers.len(), 1);
        assert_eq!(state.trade_offers[0].status, TradeStatus::Pending);
    }
}
