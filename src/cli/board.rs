//! Board command implementation.

use super::{CliError, OutputFormat};
use cryptopoly::board::{
    Money, TILES, Tile, TileKind, UTILITY_PAIR_MULTIPLIER, UTILITY_SINGLE_MULTIPLIER,
};

/// Execute the board command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub(crate) fn execute(format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => {
            println!(
                "{:>3}  {:<24} {:<12} {:>6} {:>6} {:>6}  Rent",
                "#", "Tile", "Kind", "Price", "Mortg", "House"
            );
            for tile in &TILES {
                println!("{}", describe(tile));
            }
        }
        OutputFormat::Json => {
            println!("{}", tiles_json()?);
        }
    }
    Ok(())
}

fn tiles_json() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&TILES[..])
}

fn describe(tile: &Tile) -> String {
    let money = |v: Option<Money>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
    let tiers = |rent: &[Money]| rent.iter().map(ToString::to_string).collect::<Vec<_>>().join("/");
    let (kind, house, rent) = match &tile.kind {
        TileKind::Property(p) => (p.group.display_name(), Some(p.house_cost), tiers(&p.rent)),
        TileKind::Railroad(r) => ("Exchange", None, tiers(&r.rent)),
        TileKind::Utility(_) => (
            "Utility",
            None,
            format!("{UTILITY_SINGLE_MULTIPLIER}x/{UTILITY_PAIR_MULTIPLIER}x dice"),
        ),
        TileKind::Tax { amount } => ("Tax", None, format!("pay {amount}")),
        TileKind::Go => ("Go", None, String::new()),
        TileKind::Chance => ("Volatility", None, String::new()),
        TileKind::CommunityChest => ("Airdrop", None, String::new()),
        TileKind::Jail => ("Jail", None, String::new()),
        TileKind::FreeParking => ("Parking", None, String::new()),
        TileKind::GoToJail => ("Go to jail", None, String::new()),
    };
    format!(
        "{:>3}  {:<24} {:<12} {:>6} {:>6} {:>6}  {rent}",
        tile.index,
        tile.name,
        kind,
        money(tile.price()),
        money(tile.mortgage()),
        money(house),
    )
}
