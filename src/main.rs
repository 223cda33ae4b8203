use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

mod backtest;
mod config;
mod daemon;
mod error;
mod games;
mod model;
mod odds;

use backtest::engine::{BacktestEngine, GradingMode, LineBook};
use backtest::{report, sweep};
use config::{Command, Config};
use daemon::DaemonOpts;
use games::{load_games_file, BallDontLie, GameSource};
use model::edge::evaluate;
use model::predictor::{predict, DataCoverage};
use model::{EfficiencyModel, GameLog};
use odds::{build_line_lookup, line_or_fallback, OddsSource, TheOddsApi};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    match config.command.clone() {
        Command::Predict { away, home, line } => run_predict(&config, &away, &home, line).await,
        Command::Backtest {
            games_file,
            grading,
            min_edge,
        } => run_backtest(&config, games_file.as_deref(), grading.to_mode(), min_edge).await,
        Command::Sweep {
            games_file,
            bonuses,
            edge_thresholds,
        } => run_sweep(&config, games_file.as_deref(), &bonuses, &edge_thresholds).await,
        Command::Daemon {
            run_at_hour,
            once,
            predictions_log,
        } => {
            let games = games_source(&config)?;
            let odds = odds_source(&config)?;
            let opts = DaemonOpts {
                run_at_hour,
                once,
                predictions_log,
            };
            daemon::run(&config, games.as_ref(), odds.as_ref(), &opts).await
        }
    }
}

fn games_source(config: &Config) -> Result<Box<dyn GameSource>> {
    let source = BallDontLie::new(
        config.games_api_key.as_deref(),
        config.games_api_url.as_deref(),
    )?;
    Ok(Box::new(source))
}

fn odds_source(config: &Config) -> Result<Box<dyn OddsSource>> {
    let source = TheOddsApi::new(
        config.odds_api_key.as_deref(),
        config.odds_api_url.as_deref(),
        &config.sportsbook,
        &config.odds_region,
    )?;
    Ok(Box::new(source))
}

/// Season-to-date history: from a flat file when one is given, otherwise
/// from the games API. Only the file carries historical market lines.
async fn load_history(config: &Config, games_file: Option<&Path>) -> Result<(GameLog, LineBook)> {
    match games_file {
        Some(path) => {
            let (log, lines) = load_games_file(path)?;
            info!(
                "Loaded {} games ({} with market lines) from {}",
                log.len(),
                lines.len(),
                path.display()
            );
            Ok((log, lines))
        }
        None => {
            let source = games_source(config)?;
            let completed = source
                .fetch_completed_games(&config.seasons)
                .await
                .context("failed to fetch game history")?;
            info!(
                "Fetched {} completed games from {}",
                completed.len(),
                source.name()
            );
            Ok((GameLog::from_unordered(completed), LineBook::new()))
        }
    }
}

async fn run_predict(config: &Config, away: &str, home: &str, line: Option<f64>) -> Result<()> {
    let (log, _) = load_history(config, None).await?;
    let model = EfficiencyModel::build(log.games());
    info!(
        "Model built from {} games covering {} teams",
        log.len(),
        model.team_count()
    );

    let prediction = predict(&model, away, home, config.model_params())?;
    for (team, coverage) in [
        (away, prediction.away_coverage),
        (home, prediction.home_coverage),
    ] {
        match coverage {
            DataCoverage::Full => {}
            DataCoverage::PartialFallback => {
                warn!("{} is missing a venue split; league average used", team)
            }
            DataCoverage::LeagueFallback => {
                warn!("{} has no history; full league-average profile used", team)
            }
        }
    }

    let market_line = match line {
        Some(l) => l,
        None => fetch_line(config, away, home).await,
    };
    let result = evaluate(prediction.predicted_total, market_line);

    println!("{} @ {}", prediction.away_team, prediction.home_team);
    println!("Predicted Total: {:.1}", result.predicted_total);
    println!("Market Line:     {:.1}", result.market_line);
    println!("Edge:            {:+.2}", result.edge);
    println!("Recommendation:  {}", result.recommendation);
    Ok(())
}

/// The quoted line for one match-up, degrading to the fallback when the
/// odds source is unavailable or has no quote.
async fn fetch_line(config: &Config, away: &str, home: &str) -> f64 {
    let lookup = match odds_source(config) {
        Ok(source) => match source.fetch_total_lines().await {
            Ok(lines) => {
                info!("Fetched {} market lines from {}", lines.len(), source.name());
                build_line_lookup(&lines)
            }
            Err(e) => {
                warn!(
                    "Market lines unavailable ({}); using fallback line {:.1}",
                    e, config.fallback_line
                );
                HashMap::new()
            }
        },
        Err(e) => {
            warn!("Odds source unavailable ({}); using fallback line", e);
            HashMap::new()
        }
    };
    line_or_fallback(&lookup, away, home, config.fallback_line)
}

async fn run_backtest(
    config: &Config,
    games_file: Option<&Path>,
    grading: GradingMode,
    min_edge: f64,
) -> Result<()> {
    let (log, lines) = load_history(config, games_file).await?;
    if grading == GradingMode::MarketLine && lines.is_empty() {
        warn!(
            "No historical market lines available; every step grades against the fallback line {:.1}",
            config.fallback_line
        );
    }

    let engine = BacktestEngine::new(config.backtest_config(grading, min_edge));
    let result = engine.run(&log, &lines)?;

    print!("{}", report::render_records(&result.records));
    print!("{}", report::render_summary(&result.summary));
    Ok(())
}

async fn run_sweep(
    config: &Config,
    games_file: Option<&Path>,
    bonuses: &[f64],
    edge_thresholds: &[f64],
) -> Result<()> {
    let (log, lines) = load_history(config, games_file).await?;
    let grading = if lines.is_empty() {
        info!("No market lines in the input; sweeping prediction error against realized totals");
        GradingMode::RealizedTotal
    } else {
        GradingMode::MarketLine
    };

    let base = config.backtest_config(grading, 0.0);
    let rows = sweep::sweep_parameters(&log, &lines, &base, bonuses, edge_thresholds)?;
    print!("{}", report::render_sweep(&rows));

    let best = match grading {
        GradingMode::MarketLine => sweep::best_row(&rows),
        GradingMode::RealizedTotal => sweep::lowest_error_row(&rows),
    };
    if let Some(row) = best {
        info!(
            "Best cell: bonus {:.1}, min edge {:.1} ({} graded, {:.1}% win rate, {:.2} avg edge)",
            row.home_court_bonus,
            row.min_edge,
            row.summary.games_tested,
            row.summary.win_rate() * 100.0,
            row.summary.avg_edge()
        );
    }
    Ok(())
}
