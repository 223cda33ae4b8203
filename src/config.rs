use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::backtest::engine::{BacktestConfig, GradingMode};
use crate::model::{ModelParams, HOME_COURT_BONUS, LEAGUE_AVERAGE_POINTS};
use crate::odds::FALLBACK_TOTAL_LINE;

/// Configuration from CLI args or environment variables.
#[derive(Parser, Debug, Clone)]
#[command(name = "nba-totals-model", version, about)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,

    /// balldontlie API key (the free tier works without one, with tight limits)
    #[arg(long, env = "GAMES_API_KEY")]
    pub games_api_key: Option<String>,

    /// Override the games API base URL
    #[arg(long, env = "GAMES_API_URL")]
    pub games_api_url: Option<String>,

    /// The Odds API key (without one, market lines fall back to the default)
    #[arg(long, env = "ODDS_API_KEY")]
    pub odds_api_key: Option<String>,

    /// Override the odds API base URL
    #[arg(long, env = "ODDS_API_URL")]
    pub odds_api_url: Option<String>,

    /// Preferred sportsbook for totals lines
    #[arg(long, env = "SPORTSBOOK", default_value = "DraftKings")]
    pub sportsbook: String,

    /// Odds region passed to the odds API
    #[arg(long, env = "ODDS_REGION", default_value = "us")]
    pub odds_region: String,

    /// Seasons to pull game history from (start year, comma separated)
    #[arg(long, env = "SEASONS", value_delimiter = ',', default_value = "2024")]
    pub seasons: Vec<u16>,

    /// League-average points per team, the fallback for missing splits
    #[arg(long, env = "LEAGUE_AVERAGE", default_value_t = LEAGUE_AVERAGE_POINTS)]
    pub league_average: f64,

    /// Flat home-court adjustment added to every predicted total
    #[arg(long, env = "HOME_COURT_BONUS", default_value_t = HOME_COURT_BONUS)]
    pub home_court_bonus: f64,

    /// Line assumed when no market quote is available
    #[arg(long, env = "FALLBACK_LINE", default_value_t = FALLBACK_TOTAL_LINE)]
    pub fallback_line: f64,

    /// Minimum completed games before the model is trusted
    #[arg(long, env = "MIN_TRAINING_GAMES", default_value_t = 4)]
    pub min_training_games: usize,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Predict the total for one match-up and compare it to a line
    Predict {
        /// Visiting team, as named by the games API
        #[arg(long)]
        away: String,
        /// Hosting team
        #[arg(long)]
        home: String,
        /// Market line to evaluate against (fetched, else fallback, when omitted)
        #[arg(long)]
        line: Option<f64>,
    },
    /// Replay history and grade the model
    Backtest {
        /// Flat JSON games file; the games API is used when omitted
        #[arg(long)]
        games_file: Option<PathBuf>,
        /// How steps are graded
        #[arg(long, value_enum, default_value = "market")]
        grading: GradingArg,
        /// Minimum |edge| before a step counts as a bet
        #[arg(long, default_value_t = 0.0)]
        min_edge: f64,
    },
    /// Grid-search the home-court bonus and edge threshold
    Sweep {
        /// Flat JSON games file; the games API is used when omitted
        #[arg(long)]
        games_file: Option<PathBuf>,
        /// Home-court bonus candidates
        #[arg(long, value_delimiter = ',', default_value = "2.0,2.5,3.0,3.5,4.0,4.5")]
        bonuses: Vec<f64>,
        /// Minimum-edge candidates
        #[arg(long, value_delimiter = ',', default_value = "0.0,2.0,3.0,5.0")]
        edge_thresholds: Vec<f64>,
    },
    /// Run the daily prediction cycle
    Daemon {
        /// UTC hour of the daily run
        #[arg(long, default_value_t = 10)]
        run_at_hour: u32,
        /// Run one cycle immediately and exit
        #[arg(long, default_value_t = false)]
        once: bool,
        /// Append-only predictions sink
        #[arg(long, default_value = "predictions.log")]
        predictions_log: PathBuf,
    },
}

/// CLI-facing grading mode.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingArg {
    /// Grade against historical market lines
    Market,
    /// Grade against the realized total (average edge = mean absolute error)
    Realized,
}

impl GradingArg {
    pub fn to_mode(self) -> GradingMode {
        match self {
            GradingArg::Market => GradingMode::MarketLine,
            GradingArg::Realized => GradingMode::RealizedTotal,
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.league_average.is_finite() || self.league_average <= 0.0 {
            anyhow::bail!(
                "league_average must be a positive number, got {}",
                self.league_average
            );
        }
        if !(0.0..=15.0).contains(&self.home_court_bonus) {
            anyhow::bail!(
                "home_court_bonus must be between 0 and 15, got {}",
                self.home_court_bonus
            );
        }
        if !self.fallback_line.is_finite() || self.fallback_line <= 0.0 {
            anyhow::bail!(
                "fallback_line must be a positive number, got {}",
                self.fallback_line
            );
        }
        if self.min_training_games == 0 {
            anyhow::bail!("min_training_games must be at least 1");
        }
        if self.seasons.is_empty() {
            anyhow::bail!("at least one season is required");
        }
        if let Command::Daemon { run_at_hour, .. } = &self.command {
            if *run_at_hour > 23 {
                anyhow::bail!("run_at_hour must be 0-23, got {}", run_at_hour);
            }
        }
        if let Command::Sweep {
            bonuses,
            edge_thresholds,
            ..
        } = &self.command
        {
            if bonuses.is_empty() || edge_thresholds.is_empty() {
                anyhow::bail!("sweep needs at least one bonus and one edge threshold");
            }
        }
        Ok(())
    }

    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            league_average: self.league_average,
            home_court_bonus: self.home_court_bonus,
        }
    }

    pub fn backtest_config(&self, grading: GradingMode, min_edge: f64) -> BacktestConfig {
        BacktestConfig {
            params: self.model_params(),
            min_training_games: self.min_training_games,
            grading,
            min_edge,
            fallback_line: self.fallback_line,
        }
    }
}
