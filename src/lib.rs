// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Cryptopoly: a host-authoritative, peer-to-peer property trading game.
//!
//! This crate provides the replicated state machine behind the game:
//! - A deterministic reducer: every peer applying the same actions in the
//!   same order reaches the same state
//! - Host-authoritative synchronization over any message transport
//! - Lobby and intent APIs for front ends, and bot simulations for testing
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │    Session (lobby, intents)         │
//! ├─────────────────────────────────────┤
//! │    Sync (replica, wire, transport)  │
//! ├─────────────────────────────────────┤
//! │    Game (state, reducer, rules)     │
//! ├─────────────────────────────────────┤
//! │    Board (tiles, cards, constants)  │
//! └─────────────────────────────────────┘
//! ```

pub mod board;
pub mod error;
pub mod game;
pub mod session;
pub mod simulation;
pub mod sync;

pub use error::{Rejection, SessionError, SimulationError, TransportError, WireError};

// Re-export key game types at crate root for convenience
pub use game::{GameAction, GameState, Phase, Player, PlayerId, apply_action, apply_action_at};
pub use session::{RoomCode, Session};
pub use sync::{Envelope, Replica, Transport};
