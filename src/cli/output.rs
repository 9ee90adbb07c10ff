//! Output formatting utilities for CLI.

use std::fmt::Write as _;

use cryptopoly::simulation::GameResult;
use serde::Serialize;

/// JSON-serializable game result.
#[derive(Debug, Serialize)]
pub(super) struct JsonGameResult {
    /// Random seed used.
    pub(super) seed: u64,
    /// Room code.
    pub(super) room: String,
    /// Winner player id (null if the turn limit hit).
    pub(super) winner: Option<String>,
    /// Seat of the winner or of the richest survivor.
    pub(super) leader_seat: usize,
    /// Whether the game finished.
    pub(super) finished: bool,
    /// Total turns played.
    pub(super) turns_played: u32,
    /// Messages delivered by the simulated network.
    pub(super) messages_delivered: u64,
    /// Messages lost by the simulated network.
    pub(super) messages_dropped: u64,
    /// Forced guest reconnects.
    pub(super) resyncs: u32,
    /// Whether every replica matched the host before the closing resync.
    pub(super) replicas_agreed: bool,
    /// Per-seat results.
    pub(super) seats: Vec<JsonSeatResult>,
}

/// JSON-serializable seat result.
#[derive(Debug, Serialize)]
pub(super) struct JsonSeatResult {
    /// Seat number (0 is the host).
    pub(super) seat: usize,
    /// Player id.
    pub(super) id: String,
    /// Display name.
    pub(super) name: String,
    /// Token name.
    pub(super) token: &'static str,
    /// Cash at the end.
    pub(super) money: i64,
    /// Tiles held at the end.
    pub(super) properties: usize,
    /// Liquidation value at the end.
    pub(super) net_worth: i64,
    /// Whether the seat went bankrupt.
    pub(super) bankrupt: bool,
}

impl JsonGameResult {
    /// Create from a GameResult.
    pub(super) fn from_game_result(result: &GameResult) -> Self {
        Self {
            seed: result.seed,
            room: result.room_code.clone(),
            winner: result.winner.clone(),
            leader_seat: result.leader_seat,
            finished: result.finished,
            turns_played: result.turns_played,
            messages_delivered: result.messages_delivered,
            messages_dropped: result.messages_dropped,
            resyncs: result.resyncs,
            replicas_agreed: result.replicas_agreed,
            seats: result
                .seats
                .iter()
                .map(|s| JsonSeatResult {
                    seat: s.seat,
                    id: s.player_id.clone(),
                    name: s.name.clone(),
                    token: s.token.display_name(),
                    money: s.money,
                    properties: s.properties,
                    net_worth: s.net_worth,
                    bankrupt: s.bankrupt,
                })
                .collect(),
        }
    }
}

/// Format a game result as human-readable text.
pub(super) fn format_text(result: &GameResult) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Game Result (seed: {}, room: {})", result.seed, result.room_code);
    match result.seats.get(result.leader_seat) {
        Some(leader) if result.finished => {
            let _ = writeln!(output, "  Winner: {} (seat {})", leader.name, leader.seat);
        }
        Some(leader) => {
            let _ = writeln!(
                output,
                "  Turn limit reached; leader: {} (seat {})",
                leader.name, leader.seat
            );
        }
        None => output.push_str("  Winner: none\n"),
    }
    let _ = writeln!(output, "  Turns: {}", result.turns_played);
    let _ = writeln!(
        output,
        "  Network: {} delivered, {} dropped, {} resyncs{}\n",
        result.messages_delivered,
        result.messages_dropped,
        result.resyncs,
        if result.replicas_agreed { "" } else { " (replicas diverged)" }
    );

    for seat in &result.seats {
        let _ = write!(
            output,
            "  Seat {}: {:<10} {:<9} ${:>6} cash, {:>2} tiles, ${:>6} net",
            seat.seat,
            seat.name,
            seat.token.display_name(),
            seat.money,
            seat.properties,
            seat.net_worth
        );
        if seat.bankrupt {
            output.push_str(" [bankrupt]");
        }
        output.push('\n');
    }

    output
}

/// Batch statistics for aggregated results.
#[derive(Debug, Default)]
pub(super) struct BatchStats {
    /// Games that ran to a result.
    pub(super) games_played: u64,
    /// Games that errored out.
    pub(super) failures: u64,
    /// Games that reached a winner.
    pub(super) finished: u64,
    /// Win count per seat.
    pub(super) wins: Vec<u64>,
    /// Times each seat led an unfinished game.
    pub(super) leads: Vec<u64>,
    /// Games whose replicas diverged before the closing resync.
    pub(super) diverged: u64,
    total_turns: u64,
    total_resyncs: u64,
    total_delivered: u64,
    total_dropped: u64,
}

impl BatchStats {
    /// Create new stats for n seats.
    pub(super) fn new(seats: usize) -> Self {
        Self {
            wins: vec![0; seats],
            leads: vec![0; seats],
            ..Self::default()
        }
    }

    /// Add a game result to the stats.
    pub(super) fn add_result(&mut self, result: &GameResult) {
        self.games_played += 1;
        self.total_turns += u64::from(result.turns_played);
        self.total_resyncs += u64::from(result.resyncs);
        self.total_delivered += result.messages_delivered;
        self.total_dropped += result.messages_dropped;
        if !result.replicas_agreed {
            self.diverged += 1;
        }

        let tally = if result.finished {
            self.finished += 1;
            &mut self.wins
        } else {
            &mut self.leads
        };
        if let Some(count) = tally.get_mut(result.leader_seat) {
            *count += 1;
        }
    }

    /// Count a game that errored out.
    pub(super) fn add_failure(&mut self) {
        self.failures += 1;
    }

    /// Merge another thread's stats into these.
    pub(super) fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.failures += other.failures;
        self.finished += other.finished;
        self.diverged += other.diverged;
        self.total_turns += other.total_turns;
        self.total_resyncs += other.total_resyncs;
        self.total_delivered += other.total_delivered;
        self.total_dropped += other.total_dropped;
        for (a, b) in self.wins.iter_mut().zip(&other.wins) {
            *a += b;
        }
        for (a, b) in self.leads.iter_mut().zip(&other.leads) {
            *a += b;
        }
    }

    /// Get win rate for a seat (0.0-1.0).
    #[allow(clippy::cast_precision_loss)]
    pub(super) fn win_rate(&self, seat: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.wins.get(seat).copied().unwrap_or(0) as f64 / self.games_played as f64
    }

    /// Get average game length.
    pub(super) fn avg_turns(&self) -> f64 {
        self.per_game(self.total_turns)
    }

    /// Get average forced reconnects per game.
    pub(super) fn avg_resyncs(&self) -> f64 {
        self.per_game(self.total_resyncs)
    }

    /// Share of sent messages the network lost.
    #[allow(clippy::cast_precision_loss)]
    pub(super) fn loss_rate(&self) -> f64 {
        let sent = self.total_delivered + self.total_dropped;
        if sent == 0 {
            return 0.0;
        }
        self.total_dropped as f64 / sent as f64
    }

    #[allow(clippy::cast_precision_loss)]
    fn per_game(&self, total: u64) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        total as f64 / self.games_played as f64
    }
}

/// JSON-serializable batch result.
#[derive(Debug, Serialize)]
pub(super) struct JsonBatchResult {
    /// Games that ran to a result.
    games_played: u64,
    /// Games that errored out.
    failures: u64,
    /// Games that reached a winner.
    finished: u64,
    /// Games whose replicas diverged before the closing resync.
    diverged: u64,
    /// Average game length in turns.
    avg_turns: f64,
    /// Average forced reconnects per game.
    avg_resyncs: f64,
    /// Share of messages lost.
    loss_rate: f64,
    /// Per-seat statistics.
    seats: Vec<JsonBatchSeat>,
}

/// JSON-serializable per-seat batch stats.
#[derive(Debug, Serialize)]
pub(super) struct JsonBatchSeat {
    /// Seat index (0 is the host).
    seat: usize,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Unfinished games this seat led.
    leads: u64,
}

impl JsonBatchResult {
    /// Create from aggregated stats.
    pub(super) fn from_stats(stats: &BatchStats) -> Self {
        Self {
            games_played: stats.games_played,
            failures: stats.failures,
            finished: stats.finished,
            diverged: stats.diverged,
            avg_turns: stats.avg_turns(),
            avg_resyncs: stats.avg_resyncs(),
            loss_rate: stats.loss_rate(),
            seats: (0..stats.wins.len())
                .map(|seat| JsonBatchSeat {
                    seat,
                    wins: stats.wins[seat],
                    win_rate: stats.win_rate(seat),
                    leads: stats.leads.get(seat).copied().unwrap_or(0),
                })
                .collect(),
        }
    }
}

/// Format batch stats as human-readable text.
pub(super) fn format_batch_text(stats: &BatchStats) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Batch Results ({} games)", stats.games_played);
    let _ = writeln!(output, "  Finished:    {}", stats.finished);
    let _ = writeln!(output, "  Failed:      {}", stats.failures);
    let _ = writeln!(output, "  Avg turns:   {:.1}", stats.avg_turns());
    let _ = writeln!(output, "  Avg resyncs: {:.2}", stats.avg_resyncs());
    let _ = writeln!(output, "  Loss rate:   {:.1}%", stats.loss_rate() * 100.0);
    if stats.diverged > 0 {
        let _ = writeln!(output, "  Diverged:    {}", stats.diverged);
    }
    output.push('\n');

    for seat in 0..stats.wins.len() {
        let role = if seat == 0 { "host" } else { "guest" };
        let _ = writeln!(
            output,
            "  Seat {seat} ({role:<5}): {:>5} wins ({:>5.1}%), {:>5} leads",
            stats.wins[seat],
            stats.win_rate(seat) * 100.0,
            stats.leads.get(seat).copied().unwrap_or(0)
        );
    }

    output
}

/// Format batch stats as CSV.
pub(super) fn format_batch_csv(stats: &BatchStats) -> String {
    let mut output = String::from("seat,wins,win_rate,leads,games,avg_turns\n");
    for seat in 0..stats.wins.len() {
        let _ = writeln!(
            output,
            "{seat},{},{:.4},{},{},{:.1}",
            stats.wins[seat],
            stats.win_rate(seat),
            stats.leads.get(seat).copied().unwrap_or(0),
            stats.games_played,
            stats.avg_turns()
        );
    }
    output
}
