//! Host-authoritative replication.
//!
//! The host owns the real [`GameState`](crate::game::GameState). Guests send
//! their intents to it as `ACTION_REQUEST` envelopes and never apply them
//! locally. The host applies each request, re-broadcasts the same action to
//! everyone else and answers the sender with a full `STATE_UPDATE`.
//!
//! - [`wire`](Envelope): the two envelope shapes and their JSON codec
//! - [`Transport`]: what a replica needs from the network, plus an in-memory
//!   implementation with scripted and random loss for tests and simulations
//! - [`Replica`]: the per-peer protocol driver (join retry, snapshot merge,
//!   reconnect push)

mod replica;
mod transport;
mod wire;

pub use replica::{Replica, Role, Submission, SyncConfig, adopt_snapshot};
pub use transport::{MemoryNetwork, MemoryTransport, NetworkStats, PeerEvent, Transport};
pub use wire::{Envelope, decode, encode};
