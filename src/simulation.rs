//! Simulated games.
//!
//! Provides a pure function interface: `(seed, config) -> GameResult`
//!
//! Every seat is a scripted bot with its own [`Session`] on a shared
//! [`MemoryNetwork`]. Seat 0 hosts; the rest join as guests over links that
//! may lose messages. The runner:
//! - drives the lobby until every guest is admitted, then starts the game
//! - steps a simulated clock, letting each bot act on its own replica
//! - checks invariants on the host state after every step
//! - resyncs guests whose replica went stale (disconnect + reconnect) when
//!   nobody can make progress

mod bot;

use std::time::Duration;

use crate::board::{MAX_PLAYERS, MIN_PLAYERS, Money};
use crate::error::SimulationError;
use crate::game::{
    DeterministicRng, GameState, Phase, PlayerId, Token, check_invariants, total_assets,
};
use crate::session::{Session, generate_player_id_with};
use crate::sync::{MemoryNetwork, MemoryTransport, SyncConfig};

use bot::{Policy, decide, play};

/// Simulated milliseconds per step.
const STEP_MS: u64 = 250;

/// Steps allowed for every guest to be admitted.
const LOBBY_STEPS: u32 = 2_000;

/// Salt separating the loss stream from the game stream.
const LOSS_SALT: u64 = 0x6c6f_7373_7365_6564;

/// Configuration for a simulated game.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    /// Number of seats (2-6).
    pub players: usize,
    /// Turns before the game is called for the richest player.
    pub max_turns: u32,
    /// Hard cap on simulation steps.
    pub max_steps: u32,
    /// Percentage of messages the network loses.
    pub drop_rate_percent: u8,
    /// Auction bid increment used by the bots.
    pub bid_step: Money,
    /// Chance (percent) that a bot proposes a trade after rolling.
    pub trade_percent: u8,
    /// Replication settings for every seat.
    pub sync: SyncConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            players: 4,
            max_turns: 300,
            max_steps: 50_000,
            drop_rate_percent: 0,
            bid_step: 10,
            trade_percent: 5,
            sync: SyncConfig {
                join_retry_interval: Duration::from_secs(2),
                max_join_retries: 50,
            },
        }
    }
}

/// How one seat ended up.
#[derive(Debug, Clone)]
pub struct SeatResult {
    /// Seat number; 0 is the host.
    pub seat: usize,
    /// Player id.
    pub player_id: PlayerId,
    /// Display name.
    pub name: String,
    /// Token played.
    pub token: Token,
    /// Cash at the end.
    pub money: Money,
    /// Tiles held at the end.
    pub properties: usize,
    /// Liquidation value at the end.
    pub net_worth: Money,
    /// Whether the seat went bankrupt.
    pub bankrupt: bool,
}

/// Final result of a simulated game.
#[derive(Debug, Clone)]
pub struct GameResult {
    /// The seed used for this game.
    pub seed: u64,
    /// Room the game was played in.
    pub room_code: String,
    /// Winner, if the game finished.
    pub winner: Option<PlayerId>,
    /// Seat of the winner, or of the richest player when the turn limit hit.
    pub leader_seat: usize,
    /// Whether the game reached the finished phase.
    pub finished: bool,
    /// Turns handed over.
    pub turns_played: u32,
    /// Simulation steps taken.
    pub steps: u32,
    /// Per-seat outcome, by seat.
    pub seats: Vec<SeatResult>,
    /// Messages the network delivered.
    pub messages_delivered: u64,
    /// Messages the network lost.
    pub messages_dropped: u64,
    /// Guest reconnects forced to recover stale replicas.
    pub resyncs: u32,
    /// Whether every guest matched the host once the network drained,
    /// before the closing resync.
    pub replicas_agreed: bool,
    /// The host's final state.
    pub final_state: GameState,
}

/// Run a complete game with the given seed.
///
/// # Determinism
///
/// Given the same seed and config, this function always produces the same
/// `GameResult` (timestamps included, since the clock is simulated).
///
/// # Errors
///
/// Returns an error if:
/// - the player count is outside 2-6
/// - a guest is never admitted to the room
/// - a replica breaks a game invariant
/// - the game stalls with every replica up to date
pub fn run_game(seed: u64, config: &SimulationConfig) -> Result<GameResult, SimulationError> {
    GameRunner::new(seed, config)?.run()
}

struct Seat {
    id: PlayerId,
    name: String,
    session: Session<MemoryTransport>,
}

/// The main game runner that orchestrates a simulated room.
struct GameRunner {
    seats: Vec<Seat>,
    network: MemoryNetwork,
    rng: DeterministicRng,
    config: SimulationConfig,
    policy: Policy,
    seed: u64,
    clock: u64,
    steps: u32,
    turns: u32,
    resyncs: u32,
}

impl GameRunner {
    fn new(seed: u64, config: &SimulationConfig) -> Result<Self, SimulationError> {
        let n = config.players;
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&n) {
            return Err(SimulationError::InvalidPlayerCount(n));
        }

        let mut rng = DeterministicRng::new(seed);
        let network = MemoryNetwork::with_loss(seed ^ LOSS_SALT, config.drop_rate_percent);
        let clock = 1_000;

        let host_id = generate_player_id_with(&mut rng);
        let host = Session::create_room_with(
            network.endpoint(&host_id),
            "Bot 1",
            clock,
            config.sync,
            &mut rng,
        )?;
        let room_code = host.room_code().to_string();
        let mut seats = vec![Seat {
            id: host_id.clone(),
            name: "Bot 1".to_string(),
            session: host,
        }];
        for i in 1..n {
            let id = generate_player_id_with(&mut rng);
            let name = format!("Bot {}", i + 1);
            let session = Session::join_room(
                network.endpoint(&id),
                &room_code,
                &host_id,
                &name,
                clock,
                config.sync,
            )?;
            network.connect(&host_id, &id)?;
            seats.push(Seat { id, name, session });
        }

        Ok(Self {
            seats,
            network,
            rng,
            config: *config,
            policy: Policy {
                bid_step: config.bid_step.max(1),
                trade_percent: config.trade_percent,
            },
            seed,
            clock,
            steps: 0,
            turns: 0,
            resyncs: 0,
        })
    }

    fn host_state(&self) -> &GameState {
        self.seats[0].session.state()
    }

    /// Advance the clock and let every replica handle its inbox, host first.
    fn pump_all(&mut self) {
        self.clock += STEP_MS;
        for seat in &mut self.seats {
            seat.session.tick(self.clock);
            seat.session.pump(self.clock);
        }
    }

    fn drain(&mut self) {
        for _ in 0..100 {
            if self.network.pending() == 0 {
                return;
            }
            self.pump_all();
        }
    }

    fn run(mut self) -> Result<GameResult, SimulationError> {
        self.run_lobby()?;
        self.seats[0].session.start_game_with(&mut self.rng)?;
        log::info!(
            "simulating room {} with {} bots",
            self.seats[0].session.room_code(),
            self.seats.len()
        );

        let mut last_turn = self.host_state().current_player_id().cloned();
        while self.steps < self.config.max_steps {
            self.steps += 1;
            self.pump_all();
            self.check_host()?;

            if self.host_state().phase == Phase::Finished {
                break;
            }
            let current = self.host_state().current_player_id().cloned();
            if current != last_turn {
                self.turns += 1;
                last_turn = current;
            }
            if self.turns >= self.config.max_turns {
                break;
            }

            let acted = self.play_step()?;
            if !acted && self.network.pending() == 0 && self.resync_stale() == 0 {
                return Err(SimulationError::Stalled { step: self.steps });
            }
        }

        self.drain();
        let replicas_agreed = self.stale_guests().is_empty();
        if !replicas_agreed {
            self.resync_stale();
            self.drain();
        }
        for seat in &self.seats {
            if let Some(v) = check_invariants(seat.session.state()).into_iter().next() {
                return Err(SimulationError::InvariantViolated(format!(
                    "{}: {}",
                    seat.id, v.message
                )));
            }
        }
        Ok(self.build_result(replicas_agreed))
    }

    fn run_lobby(&mut self) -> Result<(), SimulationError> {
        for _ in 0..LOBBY_STEPS {
            self.pump_all();
            let everyone_in = self.host_state().players.len() == self.seats.len();
            if everyone_in && self.seats.iter().all(|s| s.session.replica().is_admitted()) {
                return Ok(());
            }
        }
        let missing = self
            .seats
            .iter()
            .find(|s| !s.session.replica().is_admitted())
            .map_or_else(String::new, |s| s.id.clone());
        Err(SimulationError::JoinFailed(missing))
    }

    /// Let every seat make at most one move. Returns whether anyone moved.
    fn play_step(&mut self) -> Result<bool, SimulationError> {
        let mut acted = false;
        for seat in &mut self.seats {
            let Some(next) = decide(seat.session.state(), &seat.id, self.policy, &mut self.rng) else {
                continue;
            };
            log::trace!("{} plays {next:?}", seat.name);
            if play(&mut seat.session, next, &mut self.rng)?.is_some() {
                acted = true;
            }
        }
        Ok(acted)
    }

    fn check_host(&self) -> Result<(), SimulationError> {
        match check_invariants(self.host_state()).into_iter().next() {
            Some(v) => Err(SimulationError::InvariantViolated(v.message)),
            None => Ok(()),
        }
    }

    fn stale_guests(&self) -> Vec<PlayerId> {
        let host = self.host_state();
        self.seats[1..]
            .iter()
            .filter(|s| !s.session.state().same_game(host))
            .map(|s| s.id.clone())
            .collect()
    }

    /// Reconnect every guest whose replica differs from the host's.
    fn resync_stale(&mut self) -> usize {
        let stale = self.stale_guests();
        let host_id = self.seats[0].id.clone();
        for id in &stale {
            log::debug!("resyncing {id}");
            self.network.disconnect(&host_id, id);
            if let Err(e) = self.network.connect(&host_id, id) {
                log::warn!("reconnect of {id} failed: {e}");
            }
            self.resyncs += 1;
        }
        stale.len()
    }

    fn build_result(self, replicas_agreed: bool) -> GameResult {
        let state = self.host_state().clone();
        let seats: Vec<SeatResult> = self
            .seats
            .iter()
            .enumerate()
            .map(|(seat, s)| {
                let player = state.players.get(&s.id);
                SeatResult {
                    seat,
                    player_id: s.id.clone(),
                    name: s.name.clone(),
                    token: player.map_or(Token::Bitcoin, |p| p.token),
                    money: player.map_or(0, |p| p.money),
                    properties: player.map_or(0, |p| p.properties.len()),
                    net_worth: total_assets(&state, &s.id),
                    bankrupt: player.is_none_or(|p| p.is_bankrupt),
                }
            })
            .collect();

        let leader_seat = match &state.winner_id {
            Some(w) => seats.iter().position(|s| &s.player_id == w).unwrap_or(0),
            None => seats
                .iter()
                .filter(|s| !s.bankrupt)
                .max_by_key(|s| (s.net_worth, std::cmp::Reverse(s.seat)))
                .map_or(0, |s| s.seat),
        };
        let stats = self.network.stats();

        GameResult {
            seed: self.seed,
            room_code: self.seats[0].session.room_code().to_string(),
            winner: state.winner_id.clone(),
            leader_seat,
            finished: state.phase == Phase::Finished,
            turns_played: self.turns,
            steps: self.steps,
            seats,
            messages_delivered: stats.delivered,
            messages_dropped: stats.dropped,
            resyncs: self.resyncs,
            replicas_agreed,
            final_state: state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(players: usize) -> SimulationConfig {
        SimulationConfig {
            players,
            max_turns: 60,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_invalid_player_count() {
        assert_eq!(
            run_game(1, &quick(1)).unwrap_err(),
            SimulationError::InvalidPlayerCount(1)
        );
        assert_eq!(
            run_game(1, &quick(7)).unwrap_err(),
            SimulationError::InvalidPlayerCount(7)
        );
    }

    #[test]
    fn test_game_is_deterministic() {
        let a = run_game(42, &quick(3)).unwrap();
        let b = run_game(42, &quick(3)).unwrap();
        assert_eq!(a.final_state, b.final_state);
        assert_eq!(a.turns_played, b.turns_played);
        assert_eq!(a.room_code, b.room_code);
    }

    #[test]
    fn test_lossless_replicas_agree() {
        let result = run_game(7, &quick(4)).unwrap();
        assert!(result.replicas_agreed);
        assert_eq!(result.resyncs, 0);
        assert_eq!(result.messages_dropped, 0);
        assert!(result.turns_played > 0);
        assert_eq!(result.seats.len(), 4);
    }

    #[test]
    fn test_lossy_network_still_progresses() {
        let config = SimulationConfig {
            drop_rate_percent: 20,
            ..quick(3)
        };
        let result = run_game(9, &config).unwrap();
        assert!(result.messages_dropped > 0);
        assert!(result.turns_played > 0);
        assert!(check_invariants(&result.final_state).is_empty());
    }

    #[test]
    fn test_finished_game_reports_winner_seat() {
        let config = SimulationConfig {
            players: 2,
            max_turns: 5_000,
            max_steps: 200_000,
            ..SimulationConfig::default()
        };
        let result = run_game(3, &config).unwrap();
        if result.finished {
            let winner = result.winner.as_ref().unwrap();
            assert_eq!(&result.seats[result.leader_seat].player_id, winner);
            assert!(result.seats.iter().filter(|s| s.bankrupt).count() >= 1);
        }
    }
}
