//! Drawing and executing chance / community chest cards.

use super::turn::{land, send_to_jail};
use super::{active_player, player_mut, refresh_turn_phase, require_current, require_phase};
use crate::board::{
    Card, CardAction, DeckKind, GO_INDEX, GO_SALARY, HOTEL_LEVEL, Money, NearestKind,
    UTILITY_FALLBACK_DICE_TOTAL, next_railroad, next_utility, tile,
};
use crate::error::Rejection;
use crate::game::{
    DeterministicRng, GameState, PendingAction, Phase, PlayerId, calculate_rent, derive_seed,
    move_back,
};

pub(super) fn draw(state: &mut GameState, player_id: &str, deck: DeckKind) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    require_current(state, player_id)?;
    active_player(state, player_id)?;
    match state.pending_action {
        Some(PendingAction::DrawCard { card_type }) if card_type == deck => {}
        _ => return Err(Rejection::NoMatchingPendingAction),
    }

    let seed = derive_seed(&[
        state.room_id.as_bytes(),
        deck.display_name().as_bytes(),
        &state.last_dice_roll_id.to_le_bytes(),
    ]);
    let cards = match deck {
        DeckKind::Chance => &mut state.chance_cards,
        DeckKind::CommunityChest => &mut state.community_chest_cards,
    };
    if cards.is_empty() {
        // Every peer reshuffles identically from replicated inputs.
        *cards = deck.full_deck();
        DeterministicRng::new(seed).shuffle(cards);
        log::debug!("{} deck reshuffled", deck.display_name());
    }
    let card = cards.remove(0);

    log::info!("{player_id} drew \"{}\"", card.title);
    state.drawn_card = Some(card.clone());
    state.pending_action = Some(PendingAction::CardAction { card });
    refresh_turn_phase(state);
    Ok(())
}

pub(super) fn execute(state: &mut GameState, player_id: &str, card: &Card) -> Result<(), Rejection> {
    require_phase(state, Phase::Playing)?;
    require_current(state, player_id)?;
    active_player(state, player_id)?;
    let drawn = match &state.pending_action {
        Some(PendingAction::CardAction { card: drawn }) if drawn.id == card.id => drawn.clone(),
        Some(PendingAction::CardAction { .. }) => return Err(Rejection::CardMismatch),
        _ => return Err(Rejection::NoMatchingPendingAction),
    };

    state.pending_action = None;
    state.drawn_card = None;
    // The replicated copy is authoritative; the action only names the card.
    apply_card(state, player_id, drawn.action)?;
    refresh_turn_phase(state);
    Ok(())
}

fn apply_card(state: &mut GameState, player_id: &str, action: CardAction) -> Result<(), Rejection> {
    match action {
        CardAction::Collect { amount } => player_mut(state, player_id)?.money += amount,
        CardAction::Pay { amount } => {
            player_mut(state, player_id)?.money -= amount;
            state.free_parking += amount;
        }
        CardAction::PayEachPlayer { amount } => {
            for other in opponents(state, player_id) {
                player_mut(state, &other)?.money += amount;
                player_mut(state, player_id)?.money -= amount;
            }
        }
        CardAction::CollectFromEach { amount } => {
            let mut collected = 0;
            for other in opponents(state, player_id) {
                let payer = player_mut(state, &other)?;
                let paid = amount.min(payer.money.max(0));
                payer.money -= paid;
                collected += paid;
            }
            player_mut(state, player_id)?.money += collected;
        }
        CardAction::MoveTo {
            tile_index,
            collect_go,
        } => {
            let player = player_mut(state, player_id)?;
            let wraps = tile_index < player.position || tile_index == GO_INDEX;
            if collect_go && wraps {
                player.money += GO_SALARY;
            }
            player.position = tile_index;
            land(state, player_id)?;
        }
        CardAction::MoveBack { spaces } => {
            let player = player_mut(state, player_id)?;
            player.position = move_back(player.position, spaces).position;
            land(state, player_id)?;
        }
        CardAction::GoToJail => send_to_jail(state, player_id)?,
        CardAction::GetOutOfJailFree => player_mut(state, player_id)?.get_out_of_jail_cards += 1,
        CardAction::Repairs {
            per_house,
            per_hotel,
        } => {
            let bill = repair_bill(state, player_id, per_house, per_hotel)?;
            player_mut(state, player_id)?.money -= bill;
            state.free_parking += bill;
        }
        CardAction::AdvanceToNearest {
            tile_type,
            pay_multiple,
        } => advance_to_nearest(state, player_id, tile_type, pay_multiple)?,
    }
    Ok(())
}

/// Non-bankrupt players other than `player_id`, in join order.
fn opponents(state: &GameState, player_id: &str) -> Vec<PlayerId> {
    state
        .active_players()
        .filter(|p| p.id != player_id)
        .map(|p| p.id.clone())
        .collect()
}

fn repair_bill(
    state: &GameState,
    player_id: &str,
    per_house: Money,
    per_hotel: Money,
) -> Result<Money, Rejection> {
    let player = state
        .players
        .get(player_id)
        .ok_or(Rejection::UnknownPlayer)?;
    Ok(player
        .properties
        .iter()
        .filter_map(|i| state.properties.get(i))
        .map(|p| match p.houses {
            HOTEL_LEVEL => per_hotel,
            n => Money::from(n) * per_house,
        })
        .sum())
}

fn advance_to_nearest(
    state: &mut GameState,
    player_id: &str,
    kind: NearestKind,
    pay_multiple: Option<Money>,
) -> Result<(), Rejection> {
    let player = player_mut(state, player_id)?;
    let target = match kind {
        NearestKind::Railroad => next_railroad(player.position),
        NearestKind::Utility => next_utility(player.position),
    };
    if target < player.position {
        player.money += GO_SALARY;
    }
    player.position = target;

    let prop = state
        .properties
        .get(&target)
        .ok_or(Rejection::InvalidTile(target))?;
    match prop.owner_id.clone() {
        None => {
            state.pending_action = Some(PendingAction::BuyDecision {
                tile_index: target,
                price: tile(target).and_then(|t| t.price()).unwrap_or(0),
            });
        }
        Some(owner) if owner != player_id && !prop.is_mortgaged => {
            let amount = match (kind, pay_multiple) {
                (NearestKind::Utility, Some(multiple)) => {
                    let total = state
                        .current_dice_roll
                        .map_or(UTILITY_FALLBACK_DICE_TOTAL, |d| Money::from(d.total()));
                    total * multiple
                }
                (_, multiple) => {
                    calculate_rent(state, target, state.current_dice_roll) * multiple.unwrap_or(1)
                }
            };
            if amount > 0 {
                state.pending_action = Some(PendingAction::PayRent {
                    amount,
                    to_player_id: owner,
                });
            }
        }
        Some(_) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests::{act, game_with, give, refused, roll};
    use super::*;
    use crate::board::{JAIL_INDEX, chance_deck, community_chest_deck};
    use crate::game::{DiceRoll, GameAction, TurnPhase};

    fn card_with(action: CardAction) -> Card {
        Card {
            id: "test-card".into(),
            deck: DeckKind::Chance,
            title: "Test".into(),
            description: "Test card".into(),
            action,
        }
    }

    /// p0 on tile `at` holding `card`, waiting to execute it.
    fn holding(n: usize, at: u8, action: CardAction) -> GameState {
        let mut state = game_with(n);
        let card = card_with(action);
        {
            let p0 = state.players.get_mut("p0").unwrap();
            p0.position = at;
            p0.has_rolled = true;
        }
        state.current_dice_roll = Some(DiceRoll(3, 4));
        state.drawn_card = Some(card.clone());
        state.pending_action = Some(PendingAction::CardAction { card });
        state.turn_phase = TurnPhase::Action;
        state
    }

    fn execute_held(state: &GameState) -> GameState {
        act(
            state,
            GameAction::ExecuteCard {
                player_id: "p0".into(),
                card: card_with(CardAction::GoToJail),
            },
        )
    }

    #[test]
    fn test_draw_takes_front_card() {
        let state = roll(&game_with(2), "p0", 3, 4);
        let front = state.chance_cards[0].clone();
        let state = act(
            &state,
            GameAction::DrawCard {
                player_id: "p0".into(),
                card_type: DeckKind::Chance,
            },
        );
        assert_eq!(state.drawn_card.as_ref(), Some(&front));
        assert_eq!(state.chance_cards.len(), 15);
        assert_eq!(
            state.pending_action,
            Some(PendingAction::CardAction { card: front })
        );
    }

    #[test]
    fn test_draw_wrong_deck_refused() {
        let state = roll(&game_with(2), "p0", 3, 4);
        let wrong = GameAction::DrawCard {
            player_id: "p0".into(),
            card_type: DeckKind::CommunityChest,
        };
        assert_eq!(refused(&state, wrong), Rejection::NoMatchingPendingAction);
    }

    #[test]
    fn test_empty_deck_reshuffles_deterministically() {
        let mut state = roll(&game_with(2), "p0", 3, 4);
        state.chance_cards.clear();
        let draw = GameAction::DrawCard {
            player_id: "p0".into(),
            card_type: DeckKind::Chance,
        };
        let a = act(&state, draw.clone());
        let b = act(&state, draw);
        assert_eq!(a.chance_cards.len(), 15);
        assert_eq!(a.chance_cards, b.chance_cards);
        assert_eq!(a.drawn_card, b.drawn_card);
        assert!(chance_deck().contains(a.drawn_card.as_ref().unwrap()));
    }

    #[test]
    fn test_execute_requires_matching_card() {
        let state = holding(2, 7, CardAction::Collect { amount: 10 });
        let mut other = card_with(CardAction::Collect { amount: 10 });
        other.id = "chance-99".into();
        let wrong = GameAction::ExecuteCard {
            player_id: "p0".into(),
            card: other,
        };
        assert_eq!(refused(&state, wrong), Rejection::CardMismatch);
    }

    #[test]
    fn test_execute_uses_replicated_card() {
        // The action's copy claims go-to-jail; the drawn card says collect.
        let state = execute_held(&holding(2, 7, CardAction::Collect { amount: 150 }));
        let p0 = state.players.get("p0").unwrap();
        assert_eq!(p0.money, 1650);
        assert!(!p0.in_jail);
        assert!(state.drawn_card.is_none());
        assert_eq!(state.turn_phase, TurnPhase::PostRoll);
    }

    #[test]
    fn test_pay_card_feeds_pot_and_may_overdraw() {
        let mut state = holding(2, 7, CardAction::Pay { amount: 100 });
        state.players.get_mut("p0").unwrap().money = 40;
        let state = execute_held(&state);
        assert_eq!(state.players.get("p0").unwrap().money, -60);
        assert_eq!(state.free_parking, 100);
    }

    #[test]
    fn test_pay_each_and_collect_from_each() {
        let state = execute_held(&holding(3, 7, CardAction::PayEachPlayer { amount: 50 }));
        assert_eq!(state.players.get("p0").unwrap().money, 1400);
        assert_eq!(state.players.get("p2").unwrap().money, 1550);

        let mut state = holding(3, 7, CardAction::CollectFromEach { amount: 50 });
        state.players.get_mut("p1").unwrap().money = 20;
        let state = execute_held(&state);
        assert_eq!(state.players.get("p0").unwrap().money, 1570);
        assert_eq!(state.players.get("p1").unwrap().money, 0);
    }

    #[test]
    fn test_move_to_with_salary_and_landing() {
        let state = execute_held(&holding(
            2,
            36,
            CardAction::MoveTo {
                tile_index: 5,
                collect_go: true,
            },
        ));
        let p0 = state.players.get("p0").unwrap();
        assert_eq!(p0.position, 5);
        assert_eq!(p0.money, 1700);
        // Movement produced a new gate which survives execution.
        assert!(matches!(
            state.pending_action,
            Some(PendingAction::BuyDecision { tile_index: 5, .. })
        ));
        assert_eq!(state.turn_phase, TurnPhase::Action);
    }

    #[test]
    fn test_move_to_go_pays_salary() {
        let state = execute_held(&holding(
            2,
            7,
            CardAction::MoveTo {
                tile_index: 0,
                collect_go: true,
            },
        ));
        assert_eq!(state.players.get("p0").unwrap().money, 1700);
    }

    #[test]
    fn test_advance_to_go_cards_pay_salary() {
        let decks = [chance_deck(), community_chest_deck()];
        let go_cards: Vec<Card> = decks
            .iter()
            .flatten()
            .filter(|c| matches!(c.action, CardAction::MoveTo { tile_index: GO_INDEX, .. }))
            .cloned()
            .collect();
        assert_eq!(go_cards.len(), 2);

        for card in go_cards {
            let mut state = holding(2, 7, card.action);
            state.drawn_card = Some(card.clone());
            state.pending_action = Some(PendingAction::CardAction { card: card.clone() });
            let state = act(
                &state,
                GameAction::ExecuteCard {
                    player_id: "p0".into(),
                    card,
                },
            );
            let p0 = state.players.get("p0").unwrap();
            assert_eq!(p0.position, GO_INDEX);
            assert_eq!(p0.money, 1700);
        }
    }

    #[test]
    fn test_move_back_three() {
        let state = execute_held(&holding(2, 7, CardAction::MoveBack { spaces: 3 }));
        let p0 = state.players.get("p0").unwrap();
        assert_eq!(p0.position, 4);
        assert!(matches!(
            state.pending_action,
            Some(PendingAction::PayTax { .. })
        ));
    }

    #[test]
    fn test_go_to_jail_card() {
        let mut state = holding(2, 7, CardAction::GoToJail);
        state.doubles_count = 1;
        let state = execute_held(&state);
        let p0 = state.players.get("p0").unwrap();
        assert!(p0.in_jail);
        assert_eq!(p0.position, JAIL_INDEX);
        assert_eq!(state.doubles_count, 0);
        assert_eq!(state.turn_phase, TurnPhase::EndTurn);
    }

    #[test]
    fn test_repairs_bill() {
        let mut state = holding(
            2,
            7,
            CardAction::Repairs {
                per_house: 25,
                per_hotel: 100,
            },
        );
        give(&mut state, "p0", &[1, 3]);
        state.properties.get_mut(&1).unwrap().houses = 5;
        state.properties.get_mut(&3).unwrap().houses = 4;
        let state = execute_held(&state);
        assert_eq!(state.players.get("p0").unwrap().money, 1500 - 200);
        assert_eq!(state.free_parking, 200);
    }

    #[test]
    fn test_advance_to_nearest_railroad_owned() {
        let mut state = holding(
            2,
            7,
            CardAction::AdvanceToNearest {
                tile_type: NearestKind::Railroad,
                pay_multiple: Some(2),
            },
        );
        give(&mut state, "p1", &[15]);
        let state = execute_held(&state);
        assert_eq!(state.players.get("p0").unwrap().position, 15);
        assert_eq!(
            state.pending_action,
            Some(PendingAction::PayRent {
                amount: 50,
                to_player_id: "p1".into()
            })
        );
    }

    #[test]
    fn test_advance_to_nearest_utility_wraps() {
        let mut state = holding(
            2,
            36,
            CardAction::AdvanceToNearest {
                tile_type: NearestKind::Utility,
                pay_multiple: Some(10),
            },
        );
        give(&mut state, "p1", &[12]);
        let state = execute_held(&state);
        let p0 = state.players.get("p0").unwrap();
        assert_eq!(p0.position, 12);
        assert_eq!(p0.money, 1700);
        assert_eq!(
            state.pending_action,
            Some(PendingAction::PayRent {
                amount: 70,
                to_player_id: "p1".into()
            })
        );
    }

    #[test]
    fn test_advance_to_nearest_unowned_offers_purchase() {
        let state = execute_held(&holding(
            2,
            22,
            CardAction::AdvanceToNearest {
                tile_type: NearestKind::Railroad,
                pay_multiple: Some(2),
            },
        ));
        assert!(matches!(
            state.pending_action,
            Some(PendingAction::BuyDecision {
                tile_index: 25,
                price: 200
            })
        ));
    }
}
