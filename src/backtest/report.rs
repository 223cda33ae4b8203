//! Console rendering for backtest output.
//!
//! Presentation contract: predicted totals print to 1 decimal, edges to a
//! signed 2 decimals, win rates as a 1-decimal percentage. Full precision
//! lives in the records; rounding happens here only.

use crate::backtest::engine::{BacktestRecord, BacktestSummary, LineSource};
use crate::backtest::sweep::SweepRow;

fn banner() -> String {
    "=".repeat(60)
}

/// Render the summary block.
pub fn render_summary(summary: &BacktestSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", banner()));
    out.push_str("BACKTEST SUMMARY\n");
    out.push_str(&format!("{}\n", banner()));
    out.push_str(&format!("Total Games:          {}\n", summary.games_total));
    out.push_str(&format!("Bets Graded:          {}\n", summary.games_tested));
    out.push_str(&format!("Wins:                 {}\n", summary.wins));
    out.push_str(&format!("Losses:               {}\n", summary.losses));
    out.push_str(&format!("Pushes:               {}\n", summary.pushes));
    if summary.filtered > 0 {
        out.push_str(&format!("Below Edge Threshold: {}\n", summary.filtered));
    }
    out.push_str(&format!("Skipped (warm-up):    {}\n", summary.skipped_warmup));
    out.push_str(&format!(
        "Skipped (new team):   {}\n",
        summary.skipped_unknown_team
    ));
    if summary.fallback_lines > 0 {
        out.push_str(&format!("Fallback Lines Used:  {}\n", summary.fallback_lines));
    }
    out.push_str(&format!(
        "Win Rate:             {:.1}%\n",
        summary.win_rate() * 100.0
    ));
    out.push_str(&format!(
        "Avg Edge:             {:.2} points\n",
        summary.avg_edge()
    ));
    out.push_str(&format!("{}\n", banner()));
    out
}

/// Render the per-game detail table. Fallback lines are marked with `*`.
pub fn render_records(records: &[BacktestRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<11} {:<36} {:>6} {:>8} {:>7} {:>7}  {:<7} {}\n",
        "DATE", "MATCHUP", "PRED", "LINE", "ACTUAL", "EDGE", "BET", "RESULT"
    ));
    let mut any_fallback = false;
    for r in records {
        let matchup = format!("{} @ {}", r.away_team, r.home_team);
        let mark = if r.line_source == LineSource::Fallback {
            any_fallback = true;
            "*"
        } else {
            " "
        };
        out.push_str(&format!(
            "{:<11} {:<36} {:>6.1} {:>7.1}{} {:>7} {:>+7.2}  {:<7} {}\n",
            r.date,
            matchup,
            r.predicted_total,
            r.line,
            mark,
            r.actual_total,
            r.edge,
            r.recommendation.to_string(),
            r.outcome
        ));
    }
    if any_fallback {
        out.push_str("(* no historical line; fallback used)\n");
    }
    out
}

/// Render one row per sweep cell.
pub fn render_sweep(rows: &[SweepRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>6} {:>9} {:>7} {:>5} {:>7} {:>7} {:>9} {:>9}\n",
        "BONUS", "MIN EDGE", "GRADED", "WINS", "LOSSES", "PUSHES", "WIN RATE", "AVG EDGE"
    ));
    for row in rows {
        out.push_str(&format!(
            "{:>6.1} {:>9.1} {:>7} {:>5} {:>7} {:>7} {:>8.1}% {:>9.2}\n",
            row.home_court_bonus,
            row.min_edge,
            row.summary.games_tested,
            row.summary.wins,
            row.summary.losses,
            row.summary.pushes,
            row.summary.win_rate() * 100.0,
            row.summary.avg_edge()
        ));
    }
    out
}
