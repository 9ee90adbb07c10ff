//! Per-peer protocol driver.

use std::time::Duration;

use crate::error::{Rejection, TransportError};
use crate::game::{GameAction, GameState, Phase, PlayerId, apply_action_at, try_apply_action_at};
use crate::sync::transport::{PeerEvent, Transport};
use crate::sync::wire::{Envelope, decode};

/// Replication settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Delay between JOIN_GAME attempts while a guest waits to be admitted.
    pub join_retry_interval: Duration,
    /// Total JOIN_GAME attempts before a guest gives up.
    pub max_join_retries: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            join_retry_interval: Duration::from_secs(2),
            max_join_retries: 10,
        }
    }
}

/// Which side of the star this peer is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Holds the authoritative state.
    Host,
    /// Mirrors the host's state.
    Guest {
        /// Id of the host peer.
        host_id: PlayerId,
    },
}

/// What happened to a locally submitted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Host only: applied and re-broadcast.
    Applied,
    /// Host only: the reducer refused it; nothing was sent.
    Rejected(Rejection),
    /// Guest only: forwarded to the host as a request.
    Sent,
}

/// Adopt an incoming snapshot, keeping the local player's record if the
/// snapshot predates their join.
///
/// Everything else in `incoming` wins.
#[must_use]
pub fn adopt_snapshot(local: &GameState, incoming: GameState, local_id: &str) -> GameState {
    let mut adopted = incoming;
    let missing = !adopted.players.contains(local_id);
    if let Some(mine) = local.players.get(local_id).filter(|_| missing) {
        log::debug!("snapshot is missing {local_id}; keeping local record");
        adopted.players.insert(mine.clone());
    }
    adopted
}

/// One peer's replica of a room, bound to its transport.
///
/// Time is passed in explicitly (milliseconds) so that a replica can be
/// driven by a wall clock or by a simulation.
#[derive(Debug)]
pub struct Replica<T> {
    transport: T,
    role: Role,
    player_name: String,
    state: GameState,
    config: SyncConfig,
    join_attempts: u32,
    next_join_at: Option<u64>,
    host_lost: bool,
}

impl<T: Transport> Replica<T> {
    /// Wrap an authoritative state. The host is expected to be registered
    /// in it already, or to submit its own JOIN_GAME next.
    #[must_use]
    pub fn host(transport: T, player_name: &str, state: GameState, config: SyncConfig) -> Self {
        Self {
            transport,
            role: Role::Host,
            player_name: player_name.to_string(),
            state,
            config,
            join_attempts: 0,
            next_join_at: None,
            host_lost: false,
        }
    }

    /// Create a guest replica of `room_id` hosted by `host_id`.
    ///
    /// The local state starts as an empty lobby and is replaced by the
    /// first snapshot. JOIN_GAME is sent once the link to the host opens.
    #[must_use]
    pub fn guest(
        transport: T,
        host_id: &str,
        player_name: &str,
        room_id: &str,
        config: SyncConfig,
    ) -> Self {
        Self {
            transport,
            role: Role::Guest {
                host_id: host_id.to_string(),
            },
            player_name: player_name.to_string(),
            state: GameState::new(room_id, host_id, 0, 0),
            config,
            join_attempts: 0,
            next_join_at: None,
            host_lost: false,
        }
    }

    /// Current local state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// This peer's player id.
    #[must_use]
    pub fn local_id(&self) -> &str {
        self.transport.local_id()
    }

    /// This peer's display name.
    #[must_use]
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// This peer's role.
    #[must_use]
    pub const fn role(&self) -> &Role {
        &self.role
    }

    /// Whether this peer is the host.
    #[must_use]
    pub const fn is_host(&self) -> bool {
        matches!(self.role, Role::Host)
    }

    /// Guest only: whether the link to the host has closed.
    #[must_use]
    pub const fn host_lost(&self) -> bool {
        self.host_lost
    }

    /// JOIN_GAME requests sent so far.
    #[must_use]
    pub const fn join_attempts(&self) -> u32 {
        self.join_attempts
    }

    /// Whether the local player appears in a state with at least two players.
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        self.state.players.len() >= 2 && self.state.players.contains(self.local_id())
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Submit a local intent.
    ///
    /// The host applies it at `now_ms` and re-broadcasts it when accepted.
    /// A guest forwards it to the host without touching local state.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the message could not be handed to the
    /// transport. Loss in transit is not reported.
    pub fn submit(&mut self, action: GameAction, now_ms: u64) -> Result<Submission, TransportError> {
        match &self.role {
            Role::Host => match try_apply_action_at(&self.state, &action, now_ms) {
                Ok(next) => {
                    self.state = next;
                    self.transport.broadcast(&Envelope::action(action))?;
                    Ok(Submission::Applied)
                }
                Err(reason) => {
                    log::debug!("host refused own {}: {reason}", action.kind());
                    Ok(Submission::Rejected(reason))
                }
            },
            Role::Guest { host_id } => {
                let host_id = host_id.clone();
                self.transport.send(&host_id, &Envelope::action(action))?;
                Ok(Submission::Sent)
            }
        }
    }

    /// Drain and handle every queued event. Returns how many were handled.
    pub fn pump(&mut self, now_ms: u64) -> usize {
        let mut handled = 0;
        while let Some(event) = self.transport.poll_event() {
            self.handle_event(event, now_ms);
            handled += 1;
        }
        handled
    }

    /// Handle one network event.
    pub fn handle_event(&mut self, event: PeerEvent, now_ms: u64) {
        match event {
            PeerEvent::Connected(peer) => self.on_connected(&peer, now_ms),
            PeerEvent::Disconnected(peer) => self.on_disconnected(&peer),
            PeerEvent::Message { from, payload } => match decode(&payload) {
                Ok(envelope) => self.on_envelope(&from, envelope, now_ms),
                Err(e) => log::warn!("dropping message from {from}: {e}"),
            },
        }
    }

    /// Re-send JOIN_GAME if a guest is still waiting to be admitted and the
    /// retry interval has elapsed.
    pub fn tick(&mut self, now_ms: u64) {
        let Role::Guest { host_id } = &self.role else {
            return;
        };
        let Some(due) = self.next_join_at else {
            return;
        };
        if self.host_lost || now_ms < due {
            return;
        }
        if self.is_admitted() {
            self.next_join_at = None;
            return;
        }
        if self.join_attempts >= self.config.max_join_retries {
            log::warn!(
                "giving up joining {} after {} attempts",
                self.state.room_id,
                self.join_attempts
            );
            self.next_join_at = None;
            return;
        }
        let host_id = host_id.clone();
        self.send_join(&host_id, now_ms);
    }

    fn send_join(&mut self, host_id: &str, now_ms: u64) {
        let join = GameAction::JoinGame {
            player_id: self.local_id().to_string(),
            player_name: self.player_name.clone(),
        };
        if let Err(e) = self.transport.send(host_id, &Envelope::action(join)) {
            log::warn!("join request to {host_id} failed: {e}");
        }
        self.join_attempts += 1;
        let interval = u64::try_from(self.config.join_retry_interval.as_millis()).unwrap_or(u64::MAX);
        self.next_join_at = Some(now_ms.saturating_add(interval));
    }

    fn on_connected(&mut self, peer: &str, now_ms: u64) {
        match &self.role {
            Role::Host => {
                log::info!("{peer} connected to room {}", self.state.room_id);
                if self.state.phase != Phase::Lobby {
                    // A peer reloading mid-game recovers without re-joining.
                    self.send_or_warn(peer, &Envelope::snapshot(&self.state));
                }
            }
            Role::Guest { host_id } if host_id == peer => {
                self.host_lost = false;
                if !self.is_admitted() {
                    let host_id = host_id.clone();
                    self.join_attempts = 0;
                    self.send_join(&host_id, now_ms);
                }
            }
            Role::Guest { .. } => {}
        }
    }

    fn on_disconnected(&mut self, peer: &str) {
        match &self.role {
            Role::Host => log::info!("{peer} disconnected from room {}", self.state.room_id),
            Role::Guest { host_id } if host_id == peer => {
                log::warn!("lost connection to host {peer}");
                self.host_lost = true;
                self.next_join_at = None;
            }
            Role::Guest { .. } => {}
        }
    }

    fn on_envelope(&mut self, from: &str, envelope: Envelope, now_ms: u64) {
        if self.is_host() {
            match envelope {
                Envelope::ActionRequest { action } => self.serve_request(from, action, now_ms),
                Envelope::StateUpdate { .. } => log::warn!("host ignoring snapshot from {from}"),
            }
            return;
        }
        if !matches!(&self.role, Role::Guest { host_id } if host_id == from) {
            log::warn!("guest ignoring message from non-host {from}");
            return;
        }
        match envelope {
            Envelope::ActionRequest { action } => {
                self.state = apply_action_at(&self.state, &action, now_ms);
            }
            Envelope::StateUpdate { state } => {
                let local_id = self.local_id().to_string();
                self.state = adopt_snapshot(&self.state, *state, &local_id);
            }
        }
    }

    /// Apply a guest's request, fan it out if accepted, and reconcile the
    /// sender with a snapshot either way.
    fn serve_request(&mut self, from: &str, action: GameAction, now_ms: u64) {
        let allowed = match action.actor() {
            Some(actor) => actor == from,
            // START_GAME has no actor and belongs to the host alone.
            None => false,
        };
        if allowed {
            match try_apply_action_at(&self.state, &action, now_ms) {
                Ok(next) => {
                    self.state = next;
                    if let Err(e) = self
                        .transport
                        .broadcast_except(from, &Envelope::action(action))
                    {
                        log::warn!("re-broadcast failed: {e}");
                    }
                }
                Err(reason) => {
                    log::debug!("ignored {} from {from}: {reason}", action.kind());
                }
            }
        } else {
            log::warn!("{from} may not submit {}", action.kind());
        }
        self.send_or_warn(from, &Envelope::snapshot(&self.state));
    }

    fn send_or_warn(&mut self, to: &str, envelope: &Envelope) {
        if let Err(e) = self.transport.send(to, envelope) {
            log::warn!("send to {to} failed: {e}");
        }
    }
}
