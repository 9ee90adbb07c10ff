//! Game invariants - sanity checks that detect bugs.
//!
//! These should never trigger for a state produced by the reducer from a
//! fresh lobby. Tests, simulations and the `check` command run them over
//! every state they see.

use std::collections::BTreeSet;

use crate::board::{BOARD_SIZE, HOTEL_LEVEL, PropertyGroup, tile, tiles_in_group};
use crate::game::{GameState, PendingAction, Phase, has_monopoly};

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut fail = |message: String| violations.push(InvariantViolation { message });

    // Ownership is recorded on both sides.
    for (&index, prop) in &state.properties {
        if let Some(owner) = &prop.owner_id {
            match state.players.get(owner) {
                Some(p) if p.owns(index) => {}
                Some(_) => fail(format!("tile {index} owned by {owner} but missing from their list")),
                None => fail(format!("tile {index} owned by unknown player {owner}")),
            }
        }
        if prop.houses > HOTEL_LEVEL {
            fail(format!("tile {index} has {} houses", prop.houses));
        }
        if prop.houses > 0 {
            match tile(index).and_then(|t| t.as_property()) {
                None => fail(format!("tile {index} cannot hold houses")),
                Some(p) => {
                    let monopoly = prop
                        .owner_id
                        .as_deref()
                        .is_some_and(|o| has_monopoly(state, o, p.group));
                    if !monopoly {
                        fail(format!("tile {index} has houses without a monopoly"));
                    }
                }
            }
            if prop.is_mortgaged {
                fail(format!("tile {index} is mortgaged with houses"));
            }
        }
    }

    for player in &state.players {
        for &index in &player.properties {
            if state.owner_of(index) != Some(&player.id) {
                fail(format!("{} lists tile {index} they do not own", player.id));
            }
        }
        if player.position >= BOARD_SIZE {
            fail(format!("{} is off the board at {}", player.id, player.position));
        }
        if player.is_bankrupt && (!player.properties.is_empty() || player.money != 0) {
            fail(format!("bankrupt player {} still holds assets", player.id));
        }
    }

    let tokens: BTreeSet<_> = state.players.iter().map(|p| p.token).collect();
    if tokens.len() != state.players.len() {
        fail("two players share a token".to_string());
    }

    // Even-build rule.
    for group in PropertyGroup::ALL {
        let houses: Vec<u8> = tiles_in_group(group)
            .iter()
            .filter_map(|i| state.properties.get(i))
            .map(|p| p.houses)
            .collect();
        let (Some(min), Some(max)) = (houses.iter().min(), houses.iter().max()) else {
            continue;
        };
        if max - min > 1 {
            fail(format!("{} built unevenly ({min}..{max})", group.display_name()));
        }
    }

    if state.free_parking < 0 {
        fail(format!("free parking pot is negative: {}", state.free_parking));
    }

    match state.phase {
        Phase::Lobby => {}
        Phase::Playing => {
            if state.current_player_index >= state.turn_order.len() {
                fail(format!(
                    "current index {} outside turn order of {}",
                    state.current_player_index,
                    state.turn_order.len()
                ));
            }
            let seats: BTreeSet<_> = state.turn_order.iter().collect();
            if seats.len() != state.turn_order.len() {
                fail("turn order repeats a player".to_string());
            }
            for id in &state.turn_order {
                if !state.players.contains(id) {
                    fail(format!("turn order names unknown player {id}"));
                }
            }
            if state.winner_id.is_some() {
                fail("winner set while still playing".to_string());
            }
        }
        Phase::Finished => {
            if state.winner_id.is_none() {
                fail("finished without a winner".to_string());
            }
        }
    }

    if let Some(PendingAction::Auction {
        current_bid,
        current_bidder_id,
        participants,
        ..
    }) = &state.pending_action
    {
        if *current_bid < 0 {
            fail(format!("negative auction bid {current_bid}"));
        }
        if let Some(bidder) = current_bidder_id {
            if !participants.contains(bidder) {
                fail(format!("high bidder {bidder} is not participating"));
            }
        }
    }

    if let Some(PendingAction::PayRent { to_player_id, .. }) = &state.pending_action {
        let collectable = state
            .players
            .get(to_player_id)
            .is_some_and(|p| !p.is_bankrupt);
        if state.phase == Phase::Playing && !collectable {
            fail(format!("rent owed to {to_player_id}, who cannot collect it"));
        }
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &GameState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &GameState) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Player, Token};

    fn create_valid_game() -> GameState {
        let mut state = GameState::new("R", "a", 1, 0);
        state.players.insert(Player::new("a", "A", Token::Bitcoin));
        state.players.insert(Player::new("b", "B", Token::Ethereum));
        state.turn_order = vec!["a".into(), "b".into()];
        state.phase = Phase::Playing;
        for t in [1, 3] {
            state.properties.get_mut(&t).unwrap().owner_id = Some("a".into());
            state.players.get_mut("a").unwrap().properties.insert(t);
        }
        state.properties.get_mut(&1).unwrap().houses = 1;
        state
    }

    #[test]
    fn test_valid_game_passes() {
        let game = create_valid_game();
        assert!(check_invariants(&game).is_empty());
    }

    #[test]
    fn test_one_sided_ownership_detected() {
        let mut game = create_valid_game();
        game.players.get_mut("a").unwrap().properties.remove(&3);
        let violations = check_invariants(&game);
        assert!(violations[0].message.contains("missing from their list"));
    }

    #[test]
    fn test_houses_without_monopoly_detected() {
        let mut game = create_valid_game();
        game.properties.get_mut(&3).unwrap().owner_id = Some("b".into());
        game.players.get_mut("a").unwrap().properties.remove(&3);
        game.players.get_mut("b").unwrap().properties.insert(3);
        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("without a monopoly")));
    }

    #[test]
    fn test_uneven_build_detected() {
        let mut game = create_valid_game();
        game.properties.get_mut(&1).unwrap().houses = 3;
        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("unevenly")));
    }

    #[test]
    fn test_bankrupt_with_assets_detected() {
        let mut game = create_valid_game();
        game.players.get_mut("b").unwrap().is_bankrupt = true;
        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("bankrupt")));
    }

    #[test]
    fn test_rent_owed_to_departed_player_detected() {
        let mut game = create_valid_game();
        game.pending_action = Some(PendingAction::PayRent {
            amount: 4,
            to_player_id: "gone".into(),
        });
        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("cannot collect")));
    }

    #[test]
    fn test_bad_turn_index_detected() {
        let mut game = create_valid_game();
        game.current_player_index = 2;
        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("current index")));
    }
}
