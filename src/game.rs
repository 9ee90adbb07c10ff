//! Game layer for Cryptopoly.
//!
//! Implements the replicated state machine:
//! - [`GameState`], the single root aggregate every peer holds a copy of
//! - [`GameAction`], the closed set of intents that travel over the wire
//! - [`apply_action`], the deterministic reducer turning one into the next
//! - Pure query helpers (rent, monopolies, even-build rule, asset value)
//! - Dice rolling and the seeded animation stream
//! - Invariant checks used by tests, simulations and the CLI

mod action;
mod dice;
mod invariants;
mod movement;
mod player;
mod reducer;
mod rent;
mod state;
mod validation;

pub use action::GameAction;
pub use dice::{AnimationRng, DeterministicRng, DiceRoll, derive_seed, roll_dice};
pub use invariants::{InvariantViolation, assert_invariants, check_invariants};
pub use movement::{Movement, move_back, move_forward};
pub use player::{Player, PlayerId, Players, Token};
pub use reducer::{apply_action, apply_action_at, try_apply_action_at};
pub use rent::calculate_rent;
pub use state::{GameState, Phase, PendingAction, PropertyState, TradeOffer, TradeStatus, TurnPhase};
pub use validation::{
    can_afford, can_build_house, can_mortgage, can_sell_house, can_unmortgage, check_build_house,
    check_sell_house, find_winner, has_monopoly, total_assets,
};
