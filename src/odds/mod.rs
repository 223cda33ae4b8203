pub mod provider;
pub mod the_odds_api;

pub use provider::{OddsSource, TotalLine};
pub use the_odds_api::TheOddsApi;

use std::collections::HashMap;

/// Line assumed when no market quote is available for a game.
pub const FALLBACK_TOTAL_LINE: f64 = 220.5;

/// Index lines by lowercased (away, home) team names for slate matching.
pub fn build_line_lookup(lines: &[TotalLine]) -> HashMap<(String, String), f64> {
    lines
        .iter()
        .map(|l| {
            (
                (l.away_team.to_lowercase(), l.home_team.to_lowercase()),
                l.total,
            )
        })
        .collect()
}

/// The quoted line for a match-up, or the fallback when none was quoted.
pub fn line_or_fallback(
    lookup: &HashMap<(String, String), f64>,
    away_team: &str,
    home_team: &str,
    fallback: f64,
) -> f64 {
    lookup
        .get(&(away_team.to_lowercase(), home_team.to_lowercase()))
        .copied()
        .unwrap_or(fallback)
}
