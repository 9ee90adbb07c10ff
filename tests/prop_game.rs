//! Property-based tests for the reducer and the wire format.
//!
//! Random action streams are thrown at a started game; most actions are
//! illegal and must be ignored, the rest must keep the state consistent.
//! Run with: cargo test --release prop_game

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use cryptopoly::board::{BOARD_SIZE, DeckKind, chance_deck, community_chest_deck};
use cryptopoly::game::{
    DiceRoll, GameAction, GameState, Phase, Player, PlayerId, Token, TradeOffer, TradeStatus,
    apply_action_at, calculate_rent, check_invariants, move_back, move_forward,
};
use cryptopoly::sync::adopt_snapshot;

const PLAYERS: [&str; 4] = ["p0", "p1", "p2", "p3"];

fn started(n: usize) -> GameState {
    let mut state = GameState::new("PROP01", "p0", 5, 0);
    for (i, id) in PLAYERS.iter().take(n).enumerate() {
        state = apply_action_at(
            &state,
            &GameAction::JoinGame {
                player_id: (*id).to_string(),
                player_name: id.to_uppercase(),
            },
            i as u64,
        );
    }
    apply_action_at(
        &state,
        &GameAction::StartGame {
            turn_order: PLAYERS.iter().take(n).map(ToString::to_string).collect(),
        },
        10,
    )
}

fn player() -> impl Strategy<Value = PlayerId> {
    prop::sample::select(PLAYERS.to_vec()).prop_map(str::to_string)
}

fn tile_index() -> impl Strategy<Value = u8> {
    0..BOARD_SIZE
}

fn trade_id() -> impl Strategy<Value = String> {
    (0u64..4).prop_map(|n| format!("trade-{n}"))
}

fn action() -> impl Strategy<Value = GameAction> {
    prop_oneof![
        4 => (player(), 1u8..=6, 1u8..=6, any::<u32>()).prop_map(|(player_id, a, b, seed)| {
            GameAction::RollDice { player_id, result: DiceRoll(a, b), seed }
        }),
        3 => player().prop_map(|player_id| GameAction::EndTurn { player_id }),
        2 => (player(), tile_index())
            .prop_map(|(player_id, tile_index)| GameAction::BuyProperty { player_id, tile_index }),
        1 => (player(), tile_index()).prop_map(|(player_id, tile_index)| {
            GameAction::AuctionProperty { player_id, tile_index }
        }),
        1 => (player(), 0i64..600)
            .prop_map(|(player_id, amount)| GameAction::PlaceBid { player_id, amount }),
        1 => player().prop_map(|player_id| GameAction::PassAuction { player_id }),
        2 => (player(), player(), 0i64..1200).prop_map(|(player_id, to_player_id, amount)| {
            GameAction::PayRent { player_id, amount, to_player_id }
        }),
        1 => (player(), prop::sample::select(vec![100i64, 200]))
            .prop_map(|(player_id, amount)| GameAction::PayTax { player_id, amount }),
        1 => (player(), any::<bool>()).prop_map(|(player_id, chance)| GameAction::DrawCard {
            player_id,
            card_type: if chance { DeckKind::Chance } else { DeckKind::CommunityChest },
        }),
        1 => (player(), any::<bool>(), 0usize..16).prop_map(|(player_id, chance, i)| {
            let deck = if chance { chance_deck() } else { community_chest_deck() };
            GameAction::ExecuteCard { player_id, card: deck[i % deck.len()].clone() }
        }),
        1 => (player(), tile_index())
            .prop_map(|(player_id, tile_index)| GameAction::BuildHouse { player_id, tile_index }),
        1 => (player(), tile_index())
            .prop_map(|(player_id, tile_index)| GameAction::SellHouse { player_id, tile_index }),
        1 => (player(), tile_index()).prop_map(|(player_id, tile_index)| {
            GameAction::MortgageProperty { player_id, tile_index }
        }),
        1 => (player(), tile_index()).prop_map(|(player_id, tile_index)| {
            GameAction::UnmortgageProperty { player_id, tile_index }
        }),
        1 => player().prop_map(|player_id| GameAction::PayJailFine { player_id }),
        1 => player().prop_map(|player_id| GameAction::UseJailCard { player_id }),
        1 => (
            player(),
            player(),
            prop::collection::vec(tile_index(), 0..3),
            0i64..300,
            prop::collection::vec(tile_index(), 0..3),
            0i64..300,
        )
            .prop_map(|(from, to, offered, offered_money, requested, requested_money)| {
                GameAction::ProposeTrade {
                    offer: TradeOffer {
                        id: String::new(),
                        from_player_id: from,
                        to_player_id: to,
                        offered_properties: offered,
                        offered_money,
                        requested_properties: requested,
                        requested_money,
                        status: TradeStatus::Pending,
                    },
                }
            }),
        1 => (player(), trade_id())
            .prop_map(|(player_id, trade_id)| GameAction::AcceptTrade { player_id, trade_id }),
        1 => (player(), trade_id())
            .prop_map(|(player_id, trade_id)| GameAction::RejectTrade { player_id, trade_id }),
        1 => (player(), trade_id())
            .prop_map(|(player_id, trade_id)| GameAction::CancelTrade { player_id, trade_id }),
        1 => (player(), prop::option::of(player())).prop_map(|(player_id, creditor_id)| {
            GameAction::DeclareBankruptcy { player_id, creditor_id }
        }),
    ]
}

fn run(state: &GameState, actions: &[GameAction]) -> GameState {
    actions
        .iter()
        .enumerate()
        .fold(state.clone(), |s, (i, a)| apply_action_at(&s, a, 100 + i as u64))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Invariants hold after every action of a random stream.
    #[test]
    fn prop_invariants_hold(players in 2usize..=4, actions in prop::collection::vec(action(), 1..120)) {
        let mut state = started(players);
        for (i, action) in actions.iter().enumerate() {
            state = apply_action_at(&state, action, 100 + i as u64);
            let violations = check_invariants(&state);
            prop_assert!(violations.is_empty(), "after {:?}: {:?}", action, violations);
        }
    }

    /// Two replicas fed the same stream end in the same state.
    #[test]
    fn prop_reducer_deterministic(actions in prop::collection::vec(action(), 1..80)) {
        let base = started(3);
        prop_assert_eq!(run(&base, &actions), run(&base, &actions));
    }

    /// A state that went over the wire reduces exactly like the original.
    #[test]
    fn prop_wire_round_trip_reduces_identically(
        prefix in prop::collection::vec(action(), 0..60),
        next in action()
    ) {
        let state = run(&started(3), &prefix);
        let json = serde_json::to_string(&state).unwrap();
        let decoded: GameState = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(&decoded, &state);
        prop_assert_eq!(
            apply_action_at(&decoded, &next, 9_999),
            apply_action_at(&state, &next, 9_999)
        );
    }

    /// Finished games have exactly one solvent player left, and it won.
    #[test]
    fn prop_winner_is_last_solvent(actions in prop::collection::vec(action(), 1..150)) {
        let state = run(&started(2), &actions);
        if state.phase == Phase::Finished {
            let solvent: Vec<_> = state.players.iter().filter(|p| !p.is_bankrupt).collect();
            prop_assert_eq!(solvent.len(), 1);
            prop_assert_eq!(state.winner_id.as_ref(), Some(&solvent[0].id));
        }
    }

    /// Rent is never negative and mortgaged tiles charge nothing.
    #[test]
    fn prop_rent_non_negative(
        actions in prop::collection::vec(action(), 1..100),
        index in 0..BOARD_SIZE,
        a in 1u8..=6,
        b in 1u8..=6
    ) {
        let state = run(&started(3), &actions);
        let rent = calculate_rent(&state, index, Some(DiceRoll(a, b)));
        prop_assert!(rent >= 0);
        if state.properties.get(&index).is_some_and(|p| p.is_mortgaged) {
            prop_assert_eq!(rent, 0);
        }
    }

    /// Movement stays on the board and reports passing GO exactly on wrap.
    #[test]
    fn prop_movement_wraps(from in 0..BOARD_SIZE, spaces in 0u8..=12) {
        let m = move_forward(from, spaces);
        prop_assert!(m.position < BOARD_SIZE);
        prop_assert_eq!(m.passed_go, u16::from(from) + u16::from(spaces) >= u16::from(BOARD_SIZE));
        prop_assert_eq!(u16::from(m.position), (u16::from(from) + u16::from(spaces)) % u16::from(BOARD_SIZE));

        let back = move_back(m.position, spaces);
        prop_assert_eq!(back.position, from);
    }

    /// Adopting any snapshot keeps the local player's own record.
    #[test]
    fn prop_adopt_keeps_local_player(
        actions in prop::collection::vec(action(), 0..60),
        money in -500i64..5000,
        position in 0..BOARD_SIZE
    ) {
        let incoming = run(&started(2), &actions);
        let mut local = incoming.clone();
        let mut me = Player::new("late", "Late", Token::Polkadot);
        me.money = money;
        me.position = position;
        local.players.insert(me.clone());

        let adopted = adopt_snapshot(&local, incoming.clone(), "late");
        prop_assert_eq!(adopted.players.get("late"), Some(&me));
        prop_assert_eq!(adopted.players.len(), incoming.players.len() + 1);
    }
}
