//! Cryptopoly CLI - run bot games over a simulated peer network.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// Cryptopoly - a host-authoritative peer-to-peer property trading game
#[derive(Parser, Debug)]
#[command(name = "cryptopoly")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play one bot game between a host and its guests
    Simulate {
        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of players (2-6)
        #[arg(short, long, default_value = "4")]
        players: usize,

        /// Maximum turns before the game is called (default: 300)
        #[arg(short = 't', long, default_value = "300")]
        max_turns: u32,

        /// Percentage of messages the simulated network loses
        #[arg(short, long, default_value = "0")]
        drop_rate: u8,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Write the host's final snapshot to this file
        #[arg(long)]
        save: Option<std::path::PathBuf>,
    },

    /// Run many games in parallel and aggregate statistics
    Batch {
        /// Number of games to run (default: 100)
        #[arg(short, long, default_value = "100")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of players (2-6)
        #[arg(short, long, default_value = "4")]
        players: usize,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Maximum turns per game (default: 300)
        #[arg(short = 't', long)]
        max_turns: Option<u32>,

        /// Percentage of messages the simulated network loses
        #[arg(short, long, default_value = "0")]
        drop_rate: u8,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::BatchFormat,

        /// Show progress bar
        #[arg(long)]
        progress: bool,
    },

    /// Print the board tiles
    Board {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Check a saved snapshot for invariant violations
    Check {
        /// Snapshot JSON file
        #[arg(required = true)]
        snapshot: std::path::PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let result = match args.command {
        Commands::Simulate {
            seed,
            players,
            max_turns,
            drop_rate,
            format,
            save,
        } => cli::simulate::execute(seed, players, max_turns, drop_rate, format, save),

        Commands::Batch {
            games,
            seed,
            players,
            threads,
            max_turns,
            drop_rate,
            format,
            progress,
        } => cli::batch::execute(
            games, seed, players, threads, max_turns, drop_rate, format, progress,
        ),

        Commands::Board { format } => cli::board::execute(format),

        Commands::Check { snapshot } => cli::check::execute(&snapshot),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
