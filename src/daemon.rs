//! Daily prediction cycle.
//!
//! Once per day at a configured UTC hour: pull season-to-date history, build
//! a fresh model snapshot, pull the day's slate and market lines, and write
//! a prediction and edge call for every upcoming game to the log sink. The
//! snapshot is rebuilt every cycle so no stale model crosses a calendar day.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::games::provider::GameSource;
use crate::model::edge::{evaluate, EdgeResult};
use crate::model::efficiency::EfficiencyModel;
use crate::model::game_log::GameLog;
use crate::model::predictor::predict;
use crate::odds::provider::OddsSource;
use crate::odds::{build_line_lookup, line_or_fallback};

pub struct DaemonOpts {
    /// UTC hour of the daily run.
    pub run_at_hour: u32,
    /// Run one cycle immediately and exit.
    pub once: bool,
    /// Append-only predictions sink.
    pub predictions_log: PathBuf,
}

pub async fn run(
    config: &Config,
    games: &dyn GameSource,
    odds: &dyn OddsSource,
    opts: &DaemonOpts,
) -> Result<()> {
    if opts.once {
        return run_cycle(config, games, odds, opts).await;
    }

    info!(
        "📅 Daily prediction daemon started (runs at {:02}:00 UTC)",
        opts.run_at_hour
    );
    loop {
        let wait = duration_until_next_run(Utc::now(), opts.run_at_hour);
        info!("Next prediction run in {}m", wait.as_secs() / 60);
        tokio::time::sleep(wait).await;
        if let Err(e) = run_cycle(config, games, odds, opts).await {
            error!("Prediction cycle failed: {:#}", e);
        }
    }
}

async fn run_cycle(
    config: &Config,
    games: &dyn GameSource,
    odds: &dyn OddsSource,
    opts: &DaemonOpts,
) -> Result<()> {
    let today = Utc::now().date_naive();
    info!("Running predictions for {}", today);

    let completed = games
        .fetch_completed_games(&config.seasons)
        .await
        .context("failed to fetch game history")?;
    let log = GameLog::from_unordered(completed);
    let model = EfficiencyModel::build(log.games());
    info!(
        "Model built from {} games covering {} teams",
        log.len(),
        model.team_count()
    );

    let slate = games
        .fetch_slate(today)
        .await
        .context("failed to fetch today's slate")?;
    if slate.upcoming.is_empty() {
        info!("No upcoming games today");
        return Ok(());
    }

    let lookup = match odds.fetch_total_lines().await {
        Ok(lines) => {
            info!("Fetched {} market lines from {}", lines.len(), odds.name());
            build_line_lookup(&lines)
        }
        Err(e) => {
            warn!(
                "Market lines unavailable ({}); using fallback line {:.1}",
                e, config.fallback_line
            );
            HashMap::new()
        }
    };

    let params = config.model_params();
    let mut written = 0;
    for game in &slate.upcoming {
        let prediction = match predict(&model, &game.away_team, &game.home_team, params) {
            Ok(p) => p,
            Err(e) => {
                warn!("Skipping {} @ {}: {}", game.away_team, game.home_team, e);
                continue;
            }
        };
        let line = line_or_fallback(
            &lookup,
            &game.away_team,
            &game.home_team,
            config.fallback_line,
        );
        let result = evaluate(prediction.predicted_total, line);
        let entry = format_sink_line(game.date, &result, &game.away_team, &game.home_team);
        info!("{}", entry);
        if let Err(e) = append_to_sink(&opts.predictions_log, &entry) {
            warn!(
                "Could not write to {}: {}",
                opts.predictions_log.display(),
                e
            );
        } else {
            written += 1;
        }
    }
    info!(
        "🏀 {} prediction(s) written to {}",
        written,
        opts.predictions_log.display()
    );
    Ok(())
}

/// Time until the next occurrence of `hour`:00 UTC, strictly in the future.
fn duration_until_next_run(now: DateTime<Utc>, hour: u32) -> Duration {
    let target_secs = i64::from(hour.min(23)) * 3600;
    let now_secs = i64::from(now.time().num_seconds_from_midnight());
    let mut wait = target_secs - now_secs;
    if wait <= 0 {
        wait += 86_400;
    }
    Duration::from_secs(wait as u64)
}

/// One line of the predictions sink. Totals print to 1 decimal, edges to a
/// signed 2 decimals.
fn format_sink_line(date: NaiveDate, result: &EdgeResult, away: &str, home: &str) -> String {
    format!(
        "{} | {} @ {} | pred {:.1} | line {:.1} | edge {:+.2} | {}",
        date, away, home, result.predicted_total, result.market_line, result.edge,
        result.recommendation
    )
}

fn append_to_sink(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)
}
