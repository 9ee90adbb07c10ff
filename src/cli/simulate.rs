//! Simulate command implementation.

use super::output::{JsonGameResult, format_text};
use super::{CliError, OutputFormat, seed_or_clock};
use cryptopoly::simulation::{SimulationConfig, run_game};
use std::fs;
use std::path::PathBuf;

/// Execute the simulate command.
///
/// # Errors
///
/// Returns an error if the game cannot be played or the snapshot cannot be
/// written.
pub(crate) fn execute(
    seed: Option<u64>,
    players: usize,
    max_turns: u32,
    drop_rate: u8,
    format: OutputFormat,
    save: Option<PathBuf>,
) -> Result<(), CliError> {
    if drop_rate >= 100 {
        return Err(CliError::new(format!("drop rate must be below 100, got {drop_rate}")));
    }

    let config = SimulationConfig {
        players,
        max_turns,
        drop_rate_percent: drop_rate,
        ..SimulationConfig::default()
    };
    let result = run_game(seed_or_clock(seed), &config)?;

    match format {
        OutputFormat::Text => print!("{}", format_text(&result)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonGameResult::from_game_result(&result))?;
            println!("{json}");
        }
    }

    if let Some(path) = save {
        let snapshot = serde_json::to_string_pretty(&result.final_state)?;
        fs::write(&path, snapshot).map_err(|e| {
            CliError::new(format!("Failed to write {}: {e}", path.display()))
        })?;
        if format == OutputFormat::Text {
            println!("\nSnapshot saved to {}", path.display());
        }
    }

    Ok(())
}
