//! Joining, leaving, token selection and game start.

use super::bankruptcy::{
    cancel_trades_of, check_winner, drop_from_auction, lapse_rent_owed_to, release_to_bank,
};
use super::{player_mut, require_phase};
use crate::board::{MAX_PLAYERS, MIN_PLAYERS};
use crate::error::Rejection;
use crate::game::{
    DeterministicRng, GameState, Phase, Player, PlayerId, Token, TurnPhase, derive_seed,
};

pub(super) fn join(state: &mut GameState, player_id: &str, name: &str) -> Result<(), Rejection> {
    if let Some(existing) = state.players.get_mut(player_id) {
        // Rejoin under a known id: only the display name changes.
        existing.name = name.to_string();
        return Ok(());
    }
    require_phase(state, Phase::Lobby)?;
    if state.players.len() >= MAX_PLAYERS {
        return Err(Rejection::RoomFull);
    }
    let token = Token::first_free(state.players.iter().map(|p| &p.token));
    state.players.insert(Player::new(player_id, name, token));
    log::info!("{name} ({player_id}) joined room {}", state.room_id);
    Ok(())
}

pub(super) fn select_token(
    state: &mut GameState,
    player_id: &str,
    token: Token,
) -> Result<(), Rejection> {
    require_phase(state, Phase::Lobby)?;
    if state
        .players
        .iter()
        .any(|p| p.token == token && p.id != player_id)
    {
        return Err(Rejection::TokenTaken);
    }
    player_mut(state, player_id)?.token = token;
    Ok(())
}

pub(super) fn start(state: &mut GameState, requested: &[PlayerId]) -> Result<(), Rejection> {
    require_phase(state, Phase::Lobby)?;
    let count = state.players.len();
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
        return Err(Rejection::NotEnoughPlayers);
    }

    let mut order: Vec<PlayerId> = Vec::with_capacity(count);
    for id in requested {
        if state.players.contains(id) && !order.contains(id) {
            order.push(id.clone());
        }
    }
    if order.is_empty() {
        order = state.players.ids();
        let seed = derive_seed(&[state.room_id.as_bytes(), &state.created_at.to_le_bytes()]);
        DeterministicRng::new(seed).shuffle(&mut order);
    } else {
        // Players missing from an explicit order sit at the end in join order.
        for id in state.players.ids() {
            if !order.contains(&id) {
                order.push(id);
            }
        }
    }

    for p in state.players.iter_mut() {
        p.has_rolled = false;
    }
    state.turn_order = order;
    state.current_player_index = 0;
    state.turn_phase = TurnPhase::PreRoll;
    state.current_dice_roll = None;
    state.doubles_count = 0;
    state.pending_action = None;
    state.drawn_card = None;
    state.winner_id = None;
    state.phase = Phase::Playing;
    log::info!(
        "room {} started with {count} players: {}",
        state.room_id,
        state.turn_order.join(", ")
    );
    Ok(())
}

pub(super) fn leave(state: &mut GameState, player_id: &str) -> Result<(), Rejection> {
    if !state.players.contains(player_id) {
        return Err(Rejection::UnknownPlayer);
    }

    if state.phase == Phase::Playing {
        release_to_bank(state, player_id)?;
        drop_from_auction(state, player_id);
        cancel_trades_of(state, player_id);
        lapse_rent_owed_to(state, player_id);
    }

    let was_current = state.is_current(player_id);
    if let Some(seat) = state.turn_order.iter().position(|id| id == player_id) {
        state.turn_order.remove(seat);
        if seat < state.current_player_index {
            state.current_player_index -= 1;
        }
        if state.current_player_index >= state.turn_order.len() {
            state.current_player_index = 0;
        }
        if was_current && state.phase == Phase::Playing {
            // The next seat slides into the leaver's index and starts fresh.
            state.turn_phase = TurnPhase::PreRoll;
            state.current_dice_roll = None;
            state.doubles_count = 0;
            state.pending_action = None;
            state.drawn_card = None;
            if let Some(next) = state.current_player_id().cloned() {
                if let Some(p) = state.players.get_mut(&next) {
                    p.has_rolled = false;
                }
            }
        }
    }
    state.players.remove(player_id);
    log::info!("{player_id} left room {}", state.room_id);

    if state.phase == Phase::Playing {
        check_winner(state);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests::{act, game_with, give, refused, roll};
    use super::*;
    use crate::game::{GameAction, PendingAction};

    fn lobby() -> GameState {
        GameState::new("ROOM01", "h", 3, 5_000)
    }

    fn join_action(id: &str, name: &str) -> GameAction {
        GameAction::JoinGame {
            player_id: id.into(),
            player_name: name.into(),
        }
    }

    fn lobby_with(ids: &[&str]) -> GameState {
        ids.iter()
            .fold(lobby(), |s, id| act(&s, join_action(id, &id.to_uppercase())))
    }

    #[test]
    fn test_join_assigns_first_free_token() {
        let state = lobby_with(&["h", "g"]);
        assert_eq!(state.players.get("h").unwrap().token, Token::Bitcoin);
        assert_eq!(state.players.get("g").unwrap().token, Token::Ethereum);
        assert_eq!(state.players.ids(), vec!["h".to_string(), "g".to_string()]);
    }

    #[test]
    fn test_rejoin_only_renames() {
        let state = lobby_with(&["h", "g"]);
        let mut state = act(&state, join_action("g", "Guest"));
        assert_eq!(state.players.len(), 2);
        assert_eq!(state.players.get("g").unwrap().name, "Guest");
        // Renaming still works mid-game.
        state.phase = Phase::Playing;
        let state = act(&state, join_action("g", "Renamed"));
        assert_eq!(state.players.get("g").unwrap().name, "Renamed");
    }

    #[test]
    fn test_join_refused_when_full_or_started() {
        let state = lobby_with(&["a", "b", "c", "d", "e", "f"]);
        assert_eq!(refused(&state, join_action("g", "G")), Rejection::RoomFull);
        let mut started = lobby_with(&["a", "b"]);
        started.phase = Phase::Playing;
        assert_eq!(refused(&started, join_action("c", "C")), Rejection::WrongPhase);
    }

    #[test]
    fn test_select_token_refuses_taken() {
        let state = lobby_with(&["h", "g"]);
        let taken = GameAction::SelectToken {
            player_id: "g".into(),
            token: Token::Bitcoin,
        };
        assert_eq!(refused(&state, taken), Rejection::TokenTaken);
        let state = act(
            &state,
            GameAction::SelectToken {
                player_id: "g".into(),
                token: Token::Polkadot,
            },
        );
        assert_eq!(state.players.get("g").unwrap().token, Token::Polkadot);
    }

    #[test]
    fn test_start_needs_two_players() {
        let state = lobby_with(&["h"]);
        assert_eq!(
            refused(&state, GameAction::StartGame { turn_order: vec![] }),
            Rejection::NotEnoughPlayers
        );
    }

    #[test]
    fn test_start_with_explicit_order() {
        let state = lobby_with(&["h", "g", "k"]);
        let state = act(
            &state,
            GameAction::StartGame {
                turn_order: vec!["k".into(), "ghost".into(), "h".into(), "k".into()],
            },
        );
        assert_eq!(state.phase, Phase::Playing);
        assert_eq!(state.turn_order, vec!["k", "h", "g"]);
        assert!(state.is_current("k"));
        assert_eq!(state.turn_phase, TurnPhase::PreRoll);
    }

    #[test]
    fn test_default_order_is_a_deterministic_permutation() {
        let state = lobby_with(&["a", "b", "c", "d"]);
        let start = GameAction::StartGame { turn_order: vec![] };
        let x = act(&state, start.clone());
        let y = act(&state, start);
        assert_eq!(x.turn_order, y.turn_order);
        let mut sorted = x.turn_order.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_leave_in_lobby_removes_player() {
        let state = lobby_with(&["h", "g"]);
        let state = act(
            &state,
            GameAction::LeaveGame {
                player_id: "g".into(),
            },
        );
        assert_eq!(state.players.len(), 1);
    }

    #[test]
    fn test_leave_mid_game_returns_holdings_and_fixes_turn() {
        let mut state = game_with(3);
        give(&mut state, "p1", &[1, 3]);
        state.properties.get_mut(&1).unwrap().houses = 1;
        state.current_player_index = 2;
        let state = act(
            &state,
            GameAction::LeaveGame {
                player_id: "p1".into(),
            },
        );
        assert_eq!(state.turn_order, vec!["p0", "p2"]);
        assert!(state.is_current("p2"));
        assert!(state.owner_of(1).is_none());
        assert_eq!(state.properties[&1].houses, 0);
        assert!(!state.players.contains("p1"));
        assert_eq!(state.phase, Phase::Playing);
    }

    #[test]
    fn test_leave_of_current_player_hands_over_turn() {
        let mut state = game_with(3);
        state.current_player_index = 1;
        state.pending_action = Some(PendingAction::PayTax { amount: 200 });
        let state = act(
            &state,
            GameAction::LeaveGame {
                player_id: "p1".into(),
            },
        );
        assert!(state.is_current("p2"));
        assert!(state.pending_action.is_none());
        assert_eq!(state.turn_phase, TurnPhase::PreRoll);
    }

    #[test]
    fn test_leave_of_rent_recipient_frees_current_player() {
        let mut state = game_with(3);
        give(&mut state, "p1", &[6]);
        let state = roll(&state, "p0", 2, 4);
        assert!(matches!(state.pending_action, Some(PendingAction::PayRent { .. })));

        let state = act(
            &state,
            GameAction::LeaveGame {
                player_id: "p1".into(),
            },
        );
        assert!(state.pending_action.is_none());
        assert_eq!(state.turn_phase, TurnPhase::PostRoll);
        assert!(crate::game::check_invariants(&state).is_empty());

        let state = act(
            &state,
            GameAction::EndTurn {
                player_id: "p0".into(),
            },
        );
        assert!(state.is_current("p2"));
    }

    #[test]
    fn test_leave_leaving_one_player_finishes() {
        let state = act(
            &game_with(2),
            GameAction::LeaveGame {
                player_id: "p0".into(),
            },
        );
        assert_eq!(state.phase, Phase::Finished);
        assert_eq!(state.winner_id.as_deref(), Some("p1"));
    }
}
