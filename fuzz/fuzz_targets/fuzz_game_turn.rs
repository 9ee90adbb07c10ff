#![no_main]

//! Full game turn fuzzer.
//!
//! Drives a started game with a fuzzer-chosen stream of actions from any
//! seat, then checks:
//! 1. The reducer never panics
//! 2. Invariants hold after every action
//! 3. A refused action leaves the state untouched
//! 4. The state survives a trip through the wire codec

use arbitrary::Arbitrary;
use cryptopoly::board::{DeckKind, chance_deck, community_chest_deck};
use cryptopoly::game::{
    DiceRoll, GameAction, GameState, TradeOffer, TradeStatus, apply_action_at, check_invariants,
    try_apply_action_at,
};
use cryptopoly::sync::{Envelope, decode, encode};
use libfuzzer_sys::fuzz_target;

const SEATS: [&str; 4] = ["p0", "p1", "p2", "p3"];

/// A fuzzer-generated action; seats and tiles are folded into range.
#[derive(Arbitrary, Debug, Clone)]
enum FuzzAction {
    Roll { seat: u8, a: u8, b: u8, seed: u32 },
    Buy { seat: u8, tile: u8 },
    Auction { seat: u8, tile: u8 },
    Bid { seat: u8, amount: u16 },
    Pass { seat: u8 },
    PayRent { seat: u8, to: u8, amount: u16 },
    PayTax { seat: u8, amount: u16 },
    Draw { seat: u8, chance: bool },
    Execute { seat: u8, chance: bool, card: u8 },
    Build { seat: u8, tile: u8 },
    Sell { seat: u8, tile: u8 },
    Mortgage { seat: u8, tile: u8 },
    Unmortgage { seat: u8, tile: u8 },
    PayFine { seat: u8 },
    UseCard { seat: u8 },
    Propose { seat: u8, to: u8, give: Vec<u8>, money: u16, want: Vec<u8> },
    Accept { seat: u8, trade: u8 },
    Reject { seat: u8, trade: u8 },
    Cancel { seat: u8, trade: u8 },
    Bankrupt { seat: u8, creditor: Option<u8> },
    Leave { seat: u8 },
    EndTurn { seat: u8 },
}

/// Structured input for game turn fuzzing.
#[derive(Arbitrary, Debug)]
struct GameTurnInput {
    /// Number of seats (folded into 2-4).
    seats: u8,
    /// Deck shuffle seed.
    deck_seed: u64,
    /// Actions to apply in order.
    actions: Vec<FuzzAction>,
}

fn seat(n: u8, seats: usize) -> String {
    SEATS[usize::from(n) % seats].to_string()
}

fn tile(n: u8) -> u8 {
    n % 40
}

fn to_action(action: &FuzzAction, seats: usize) -> GameAction {
    let s = |n: &u8| seat(*n, seats);
    match action {
        FuzzAction::Roll { seat, a, b, seed } => GameAction::RollDice {
            player_id: s(seat),
            result: DiceRoll(a % 7, b % 7),
            seed: *seed,
        },
        FuzzAction::Buy { seat, tile: t } => GameAction::BuyProperty {
            player_id: s(seat),
            tile_index: tile(*t),
        },
        FuzzAction::Auction { seat, tile: t } => GameAction::AuctionProperty {
            player_id: s(seat),
            tile_index: tile(*t),
        },
        FuzzAction::Bid { seat, amount } => GameAction::PlaceBid {
            player_id: s(seat),
            amount: i64::from(*amount),
        },
        FuzzAction::Pass { seat } => GameAction::PassAuction { player_id: s(seat) },
        FuzzAction::PayRent { seat, to, amount } => GameAction::PayRent {
            player_id: s(seat),
            amount: i64::from(*amount),
            to_player_id: s(to),
        },
        FuzzAction::PayTax { seat, amount } => GameAction::PayTax {
            player_id: s(seat),
            amount: i64::from(*amount),
        },
        FuzzAction::Draw { seat, chance } => GameAction::DrawCard {
            player_id: s(seat),
            card_type: if *chance { DeckKind::Chance } else { DeckKind::CommunityChest },
        },
        FuzzAction::Execute { seat, chance, card } => {
            let deck = if *chance { chance_deck() } else { community_chest_deck() };
            GameAction::ExecuteCard {
                player_id: s(seat),
                card: deck[usize::from(*card) % deck.len()].clone(),
            }
        }
        FuzzAction::Build { seat, tile: t } => GameAction::BuildHouse {
            player_id: s(seat),
            tile_index: tile(*t),
        },
        FuzzAction::Sell { seat, tile: t } => GameAction::SellHouse {
            player_id: s(seat),
            tile_index: tile(*t),
        },
        FuzzAction::Mortgage { seat, tile: t } => GameAction::MortgageProperty {
            player_id: s(seat),
            tile_index: tile(*t),
        },
        FuzzAction::Unmortgage { seat, tile: t } => GameAction::UnmortgageProperty {
            player_id: s(seat),
            tile_index: tile(*t),
        },
        FuzzAction::PayFine { seat } => GameAction::PayJailFine { player_id: s(seat) },
        FuzzAction::UseCard { seat } => GameAction::UseJailCard { player_id: s(seat) },
        FuzzAction::Propose {
            seat,
            to,
            give,
            money,
            want,
        } => GameAction::ProposeTrade {
            offer: TradeOffer {
                id: String::new(),
                from_player_id: s(seat),
                to_player_id: s(to),
                offered_properties: give.iter().take(4).map(|t| tile(*t)).collect(),
                offered_money: i64::from(*money),
                requested_properties: want.iter().take(4).map(|t| tile(*t)).collect(),
                requested_money: 0,
                status: TradeStatus::Pending,
            },
        },
        FuzzAction::Accept { seat, trade } => GameAction::AcceptTrade {
            player_id: s(seat),
            trade_id: format!("trade-{}", trade % 8),
        },
        FuzzAction::Reject { seat, trade } => GameAction::RejectTrade {
            player_id: s(seat),
            trade_id: format!("trade-{}", trade % 8),
        },
        FuzzAction::Cancel { seat, trade } => GameAction::CancelTrade {
            player_id: s(seat),
            trade_id: format!("trade-{}", trade % 8),
        },
        FuzzAction::Bankrupt { seat, creditor } => GameAction::DeclareBankruptcy {
            player_id: s(seat),
            creditor_id: creditor.as_ref().map(s),
        },
        FuzzAction::Leave { seat } => GameAction::LeaveGame { player_id: s(seat) },
        FuzzAction::EndTurn { seat } => GameAction::EndTurn { player_id: s(seat) },
    }
}

fn started(seats: usize, deck_seed: u64) -> GameState {
    let mut state = GameState::new("FUZZ01", SEATS[0], deck_seed, 0);
    for id in SEATS.iter().take(seats) {
        let join = GameAction::JoinGame {
            player_id: (*id).to_string(),
            player_name: id.to_uppercase(),
        };
        state = apply_action_at(&state, &join, 0);
    }
    let start = GameAction::StartGame {
        turn_order: Vec::new(),
    };
    apply_action_at(&state, &start, 0)
}

fuzz_target!(|input: GameTurnInput| {
    // Cap values to avoid excessive runtime
    let seats = 2 + usize::from(input.seats % 3);
    let actions: Vec<_> = input.actions.into_iter().take(200).collect();

    let mut state = started(seats, input.deck_seed);
    let violations = check_invariants(&state);
    assert!(violations.is_empty(), "Invariants violated at start: {violations:?}");

    for (step, fuzz_action) in actions.iter().enumerate() {
        let action = to_action(fuzz_action, seats);
        let now = 1_000 + step as u64;
        match try_apply_action_at(&state, &action, now) {
            Ok(next) => state = next,
            Err(_) => {
                assert_eq!(apply_action_at(&state, &action, now), state);
                continue;
            }
        }

        let violations = check_invariants(&state);
        assert!(
            violations.is_empty(),
            "Invariants violated after {action:?}: {violations:?}"
        );
    }

    let bytes = encode(&Envelope::snapshot(&state)).expect("state encodes");
    match decode(&bytes) {
        Ok(Envelope::StateUpdate { state: decoded }) => assert_eq!(*decoded, state),
        other => panic!("snapshot did not round trip: {other:?}"),
    }
});
