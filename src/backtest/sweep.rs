//! Parameter grid search over repeated backtests.
//!
//! Re-runs the full replay for every (home-court bonus, edge threshold)
//! combination. Each cell gets a fresh engine, so no state crosses runs and
//! cells can be compared directly.

use crate::backtest::engine::{BacktestConfig, BacktestEngine, BacktestSummary, LineBook};
use crate::error::ModelError;
use crate::model::game_log::GameLog;
use crate::model::ModelParams;

/// Summary for one parameter combination.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRow {
    pub home_court_bonus: f64,
    pub min_edge: f64,
    pub summary: BacktestSummary,
}

/// Run the backtest over the cartesian product of bonus values and edge
/// thresholds, in bonus-major order.
pub fn sweep_parameters(
    games: &GameLog,
    lines: &LineBook,
    base: &BacktestConfig,
    bonuses: &[f64],
    edge_thresholds: &[f64],
) -> Result<Vec<SweepRow>, ModelError> {
    let mut rows = Vec::with_capacity(bonuses.len() * edge_thresholds.len());
    for &bonus in bonuses {
        for &min_edge in edge_thresholds {
            let config = BacktestConfig {
                params: ModelParams {
                    home_court_bonus: bonus,
                    ..base.params
                },
                min_edge,
                ..*base
            };
            let report = BacktestEngine::new(config).run(games, lines)?;
            rows.push(SweepRow {
                home_court_bonus: bonus,
                min_edge,
                summary: report.summary,
            });
        }
    }
    Ok(rows)
}

/// The row with the best win rate, ties broken by more graded games.
pub fn best_row(rows: &[SweepRow]) -> Option<&SweepRow> {
    rows.iter().max_by(|a, b| {
        let ka = (a.summary.win_rate(), a.summary.games_tested);
        let kb = (b.summary.win_rate(), b.summary.games_tested);
        ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
    })
}

/// The row with the lowest average edge among rows that graded anything —
/// the best cell when the sweep measures prediction error.
pub fn lowest_error_row(rows: &[SweepRow]) -> Option<&SweepRow> {
    rows.iter()
        .filter(|r| r.summary.games_tested > 0)
        .min_by(|a, b| {
            a.summary
                .avg_edge()
                .partial_cmp(&b.summary.avg_edge())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}
