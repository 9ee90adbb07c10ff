//! Batch command implementation.

use super::output::{BatchStats, JsonBatchResult, format_batch_csv, format_batch_text};
use super::{BatchFormat, CliError, seed_or_clock};
use cryptopoly::simulation::{SimulationConfig, run_game};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::time::Instant;

/// Execute the batch command.
///
/// # Errors
///
/// Returns an error if the arguments are out of range or output fails.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    games: u64,
    seed: Option<u64>,
    players: usize,
    threads: Option<usize>,
    max_turns: Option<u32>,
    drop_rate: u8,
    format: BatchFormat,
    progress: bool,
) -> Result<(), CliError> {
    if drop_rate >= 100 {
        return Err(CliError::new(format!("drop rate must be below 100, got {drop_rate}")));
    }

    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = seed_or_clock(seed);

    let mut config = SimulationConfig {
        players,
        drop_rate_percent: drop_rate,
        ..SimulationConfig::default()
    };
    if let Some(t) = max_turns {
        config.max_turns = t;
    }

    let pb = if progress {
        let pb = ProgressBar::new(games);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
            .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    // Each thread folds into its own stats; merged once at the end.
    let stats = (0..games)
        .into_par_iter()
        .fold(
            || BatchStats::new(players),
            |mut local, i| {
                match run_game(base_seed.wrapping_add(i), &config) {
                    Ok(result) => local.add_result(&result),
                    Err(e) => {
                        log::warn!("game {} failed: {e}", base_seed.wrapping_add(i));
                        local.add_failure();
                    }
                }
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                local
            },
        )
        .reduce(
            || BatchStats::new(players),
            |mut a, b| {
                a.merge(&b);
                a
            },
        );

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();

    match format {
        BatchFormat::Text => {
            println!();
            print!("{}", format_batch_text(&stats));
            println!();
            #[allow(clippy::cast_precision_loss)]
            let games_per_sec = if duration.as_secs_f64() > 0.0 {
                (stats.games_played + stats.failures) as f64 / duration.as_secs_f64()
            } else {
                0.0
            };
            println!("Duration: {:.2}s ({games_per_sec:.0} games/sec)", duration.as_secs_f64());
        }
        BatchFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonBatchResult::from_stats(&stats))?;
            println!("{json}");
        }
        BatchFormat::Csv => {
            print!("{}", format_batch_csv(&stats));
        }
    }

    Ok(())
}
