//! Envelope framing for the peer channel.

use serde::{Deserialize, Serialize};

use crate::error::WireError;
use crate::game::{GameAction, GameState};

/// One message on the peer channel.
///
/// Serialized as `{"type": "ACTION_REQUEST", "action": {...}}` or
/// `{"type": "STATE_UPDATE", "state": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Envelope {
    /// An action: a guest's request to the host, or the host's re-broadcast.
    ActionRequest {
        /// The action to apply.
        action: GameAction,
    },
    /// A full authoritative snapshot.
    StateUpdate {
        /// The host's state.
        state: Box<GameState>,
    },
}

impl Envelope {
    /// Wrap an action.
    #[must_use]
    pub const fn action(action: GameAction) -> Self {
        Self::ActionRequest { action }
    }

    /// Wrap a copy of `state`.
    #[must_use]
    pub fn snapshot(state: &GameState) -> Self {
        Self::StateUpdate {
            state: Box::new(state.clone()),
        }
    }
}

/// Encode an envelope to JSON bytes.
///
/// # Errors
///
/// Returns [`WireError`] if serialization fails.
pub fn encode(envelope: &Envelope) -> Result<Vec<u8>, WireError> {
    serde_json::to_vec(envelope).map_err(WireError::new)
}

/// Decode an envelope from JSON bytes.
///
/// # Errors
///
/// Returns [`WireError`] for malformed JSON, unknown envelope or action
/// types, and missing fields.
pub fn decode(bytes: &[u8]) -> Result<Envelope, WireError> {
    serde_json::from_slice(bytes).map_err(WireError::new)
}
