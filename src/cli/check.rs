//! Snapshot check command implementation.

use super::CliError;
use cryptopoly::GameState;
use cryptopoly::game::check_invariants;
use std::fs;
use std::path::Path;

/// Execute the check command.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be read or parsed, or if any
/// invariant is violated.
pub(crate) fn execute(snapshot: &Path) -> Result<(), CliError> {
    let text = fs::read_to_string(snapshot).map_err(|e| {
        CliError::new(format!("Failed to read {}: {e}", snapshot.display()))
    })?;

    println!("Checking: {}", snapshot.display());
    println!();

    let parsed = serde_json::from_str::<GameState>(&text);
    print_check("Snapshot parses", parsed.is_ok());
    let state = parsed.map_err(|e| CliError::new(format!("Not a game snapshot: {e}")))?;

    let violations = check_invariants(&state);
    print_check("Invariants hold", violations.is_empty());
    for v in &violations {
        println!("      - {}", v.message);
    }

    println!();
    println!("Summary:");
    println!("  Room:     {}", state.room_id);
    println!("  Phase:    {:?}", state.phase);
    println!("  Players:  {}", state.players.len());
    println!("  Owned:    {} tiles", state.properties.values().filter(|p| p.owner_id.is_some()).count());
    if let Some(winner) = &state.winner_id {
        println!("  Winner:   {winner}");
    }

    if !violations.is_empty() {
        return Err(CliError::new(format!("{} invariant violation(s)", violations.len())));
    }

    println!();
    println!("Snapshot is consistent.");

    Ok(())
}

fn print_check(name: &str, ok: bool) {
    let status = if ok { "OK" } else { "FAILED" };
    let symbol = if ok { "✓" } else { "✗" };
    println!("  {symbol} {name}: {status}");
}
