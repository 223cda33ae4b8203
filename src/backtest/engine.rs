//! Chronological backtest of the totals model.
//!
//! Replays a completed-game log in date order. For every game the engine
//! rebuilds the efficiency model from scratch using only games played on
//! strictly earlier dates, so information can never leak backwards from the
//! game being graded or from elsewhere on the same slate day.
//!
//! Two grading modes:
//! - [`GradingMode::MarketLine`] — grade against historical sportsbook
//!   lines, producing a real win/loss record.
//! - [`GradingMode::RealizedTotal`] — grade against the realized total
//!   itself; every graded game lands as a push and the average edge becomes
//!   the model's mean absolute error in points.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;

use crate::error::ModelError;
use crate::model::edge::{self, Recommendation};
use crate::model::efficiency::EfficiencyModel;
use crate::model::game_log::{Game, GameLog};
use crate::model::predictor::predict;
use crate::model::ModelParams;
use crate::odds::FALLBACK_TOTAL_LINE;

// ── Configuration ────────────────────────────────────────────────────────────

/// Where each step's grading line comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingMode {
    /// The realized combined score is the line.
    RealizedTotal,
    /// Historical market lines; games without one use the fallback line.
    MarketLine,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    pub params: ModelParams,
    /// Minimum prior games before a step is graded.
    pub min_training_games: usize,
    pub grading: GradingMode,
    /// Steps with |edge| below this are recorded but not bet. 0.0 disables.
    pub min_edge: f64,
    /// Line used in market mode when no historical line exists for a game.
    pub fallback_line: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            params: ModelParams::default(),
            min_training_games: 4,
            grading: GradingMode::MarketLine,
            min_edge: 0.0,
            fallback_line: FALLBACK_TOTAL_LINE,
        }
    }
}

/// Historical market lines keyed by (date, home team, away team).
///
/// Team names match case-insensitively. The book never guesses: a missing
/// entry stays missing and the engine decides what to do about it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineBook {
    lines: HashMap<(NaiveDate, String, String), f64>,
}

impl LineBook {
    pub fn new() -> Self {
        LineBook::default()
    }

    pub fn insert(&mut self, date: NaiveDate, home_team: &str, away_team: &str, line: f64) {
        self.lines.insert(
            (date, home_team.to_lowercase(), away_team.to_lowercase()),
            line,
        );
    }

    /// The quoted total for this game, if one was recorded.
    pub fn line_for(&self, game: &Game) -> Option<f64> {
        self.lines
            .get(&(
                game.date,
                game.home_team.to_lowercase(),
                game.away_team.to_lowercase(),
            ))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// ── Results ──────────────────────────────────────────────────────────────────

/// How a graded step resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Win,
    Loss,
    Push,
    /// |edge| fell below the betting threshold; predicted but not bet.
    Filtered,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepOutcome::Win => "WIN",
            StepOutcome::Loss => "LOSS",
            StepOutcome::Push => "PUSH",
            StepOutcome::Filtered => "FILTERED",
        };
        f.write_str(s)
    }
}

/// Where the line used for grading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSource {
    Realized,
    Market,
    Fallback,
}

/// One predicted game.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestRecord {
    pub date: NaiveDate,
    pub away_team: String,
    pub home_team: String,
    pub predicted_total: f64,
    pub line: f64,
    pub line_source: LineSource,
    pub actual_total: u32,
    /// Signed, rounded to 2 decimals.
    pub edge: f64,
    pub recommendation: Recommendation,
    pub outcome: StepOutcome,
    /// Size of the training slice this step's model was built from.
    pub training_games: usize,
}

/// Aggregate counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BacktestSummary {
    /// Every game in the input log.
    pub games_total: usize,
    /// Games graded as a bet (wins + losses + pushes).
    pub games_tested: usize,
    pub wins: usize,
    pub losses: usize,
    pub pushes: usize,
    /// Predicted but below the edge threshold; no bet placed.
    pub filtered: usize,
    /// Skipped: not enough prior games.
    pub skipped_warmup: usize,
    /// Skipped: a team with no prior games at all.
    pub skipped_unknown_team: usize,
    /// Market-mode steps graded against the fallback line.
    pub fallback_lines: usize,
    /// Sum of |edge| over graded games.
    pub total_edge: f64,
}

impl BacktestSummary {
    /// Wins over decided bets. 0 when nothing was decided.
    pub fn win_rate(&self) -> f64 {
        let decided = self.wins + self.losses;
        if decided == 0 {
            0.0
        } else {
            self.wins as f64 / decided as f64
        }
    }

    /// Mean |edge| over graded games. 0 when none were graded.
    pub fn avg_edge(&self) -> f64 {
        if self.games_tested == 0 {
            0.0
        } else {
            self.total_edge / self.games_tested as f64
        }
    }
}

/// Full output of one run: per-game records plus the counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestReport {
    pub records: Vec<BacktestRecord>,
    pub summary: BacktestSummary,
}

// ── Engine ───────────────────────────────────────────────────────────────────

/// Replays history and grades the model. Holds configuration only; every
/// [`BacktestEngine::run`] is independent and rebuilds all state from its
/// inputs.
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig) -> Self {
        BacktestEngine { config }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run the full replay. `lines` is consulted only in market mode; pass
    /// an empty book otherwise.
    pub fn run(&self, games: &GameLog, lines: &LineBook) -> Result<BacktestReport, ModelError> {
        let mut records = Vec::new();
        let mut summary = BacktestSummary {
            games_total: games.len(),
            ..BacktestSummary::default()
        };

        for game in games.games() {
            let training = games.before(game.date);
            match self.step(training, game, lines) {
                Ok(record) => {
                    match record.outcome {
                        StepOutcome::Win => summary.wins += 1,
                        StepOutcome::Loss => summary.losses += 1,
                        StepOutcome::Push => summary.pushes += 1,
                        StepOutcome::Filtered => summary.filtered += 1,
                    }
                    if record.outcome != StepOutcome::Filtered {
                        summary.games_tested += 1;
                        summary.total_edge += record.edge.abs();
                    }
                    if record.line_source == LineSource::Fallback {
                        summary.fallback_lines += 1;
                    }
                    records.push(record);
                }
                Err(ModelError::InsufficientHistory { .. }) => summary.skipped_warmup += 1,
                Err(ModelError::MissingTeamData(_)) => summary.skipped_unknown_team += 1,
                Err(e) => return Err(e),
            }
        }

        Ok(BacktestReport { records, summary })
    }

    fn step(
        &self,
        training: &[Game],
        game: &Game,
        lines: &LineBook,
    ) -> Result<BacktestRecord, ModelError> {
        if training.len() < self.config.min_training_games {
            return Err(ModelError::InsufficientHistory {
                required: self.config.min_training_games,
                available: training.len(),
            });
        }

        let model = EfficiencyModel::build(training);
        if !model.contains(&game.home_team) {
            return Err(ModelError::MissingTeamData(game.home_team.clone()));
        }
        if !model.contains(&game.away_team) {
            return Err(ModelError::MissingTeamData(game.away_team.clone()));
        }

        let prediction = predict(&model, &game.away_team, &game.home_team, self.config.params)?;

        let actual_total = game.total();
        let (line, line_source) = match self.config.grading {
            GradingMode::RealizedTotal => (f64::from(actual_total), LineSource::Realized),
            GradingMode::MarketLine => match lines.line_for(game) {
                Some(l) => (l, LineSource::Market),
                None => (self.config.fallback_line, LineSource::Fallback),
            },
        };

        let result = edge::evaluate(prediction.predicted_total, line);
        let outcome = if result.edge.abs() < self.config.min_edge {
            StepOutcome::Filtered
        } else {
            classify(result.recommendation, line, actual_total)
        };

        Ok(BacktestRecord {
            date: game.date,
            away_team: game.away_team.clone(),
            home_team: game.home_team.clone(),
            predicted_total: prediction.predicted_total,
            line,
            line_source,
            actual_total,
            edge: result.edge,
            recommendation: result.recommendation,
            outcome,
            training_games: training.len(),
        })
    }
}

/// Grade one bet. Push beats everything: a zero edge (the model refused to
/// pick a side) or a total landing exactly on the line is neither a win nor
/// a loss.
fn classify(recommendation: Recommendation, line: f64, actual_total: u32) -> StepOutcome {
    let actual = f64::from(actual_total);
    if recommendation == Recommendation::NoBet || actual == line {
        return StepOutcome::Push;
    }
    let realized_side = if actual > line {
        Recommendation::Over
    } else {
        Recommendation::Under
    };
    if recommendation == realized_side {
        StepOutcome::Win
    } else {
        StepOutcome::Loss
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, day).unwrap()
    }

    fn game(day: u32, home: &str, away: &str, hp: u32, ap: u32) -> Game {
        Game {
            date: d(day),
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_points: hp,
            away_points: ap,
        }
    }

    /// Five games between two teams, alternating venues. With a 3-game
    /// warm-up the last two games are graded:
    ///   game 4 prediction 223.5, game 5 prediction 220.5.
    fn two_team_log() -> GameLog {
        GameLog::from_unordered(vec![
            game(20, "Boston Celtics", "Miami Heat", 110, 100),
            game(21, "Miami Heat", "Boston Celtics", 105, 115),
            game(22, "Boston Celtics", "Miami Heat", 120, 104),
            game(23, "Miami Heat", "Boston Celtics", 102, 108),
            game(24, "Boston Celtics", "Miami Heat", 112, 110),
        ])
    }

    fn two_team_lines() -> LineBook {
        let mut book = LineBook::new();
        book.insert(d(23), "Miami Heat", "Boston Celtics", 222.0);
        book.insert(d(24), "Boston Celtics", "Miami Heat", 219.0);
        book
    }

    fn config(grading: GradingMode, min_training_games: usize) -> BacktestConfig {
        BacktestConfig {
            min_training_games,
            grading,
            ..BacktestConfig::default()
        }
    }

    #[test]
    fn test_market_grading_end_to_end() {
        let engine = BacktestEngine::new(config(GradingMode::MarketLine, 3));
        let report = engine.run(&two_team_log(), &two_team_lines()).unwrap();

        assert_eq!(report.summary.games_total, 5);
        assert_eq!(report.summary.skipped_warmup, 3);
        assert_eq!(report.summary.games_tested, 2);

        // Game 4: predicted 223.5 vs line 222.0 → OVER, actual 210 → loss.
        let g4 = &report.records[0];
        assert_eq!(g4.predicted_total, 223.5);
        assert_eq!(g4.edge, 1.5);
        assert_eq!(g4.recommendation, Recommendation::Over);
        assert_eq!(g4.outcome, StepOutcome::Loss);
        assert_eq!(g4.line_source, LineSource::Market);

        // Game 5: predicted 220.5 vs line 219.0 → OVER, actual 222 → win.
        let g5 = &report.records[1];
        assert_eq!(g5.predicted_total, 220.5);
        assert_eq!(g5.edge, 1.5);
        assert_eq!(g5.outcome, StepOutcome::Win);

        assert_eq!(report.summary.wins, 1);
        assert_eq!(report.summary.losses, 1);
        assert_eq!(report.summary.pushes, 0);
        assert_relative_eq!(report.summary.total_edge, 3.0);
        assert_relative_eq!(report.summary.win_rate(), 0.5);
        assert_relative_eq!(report.summary.avg_edge(), 1.5);
    }

    #[test]
    fn test_realized_grading_measures_absolute_error() {
        let engine = BacktestEngine::new(config(GradingMode::RealizedTotal, 3));
        let report = engine.run(&two_team_log(), &LineBook::new()).unwrap();

        // Every graded step pushes against its own realized total.
        assert_eq!(report.summary.games_tested, 2);
        assert_eq!(report.summary.pushes, 2);
        assert_eq!(report.summary.wins, 0);
        assert_eq!(report.summary.losses, 0);
        // |223.5 - 210| + |220.5 - 222| = 15.0
        assert_relative_eq!(report.summary.total_edge, 15.0);
        assert_relative_eq!(report.summary.avg_edge(), 7.5);
        assert!(report
            .records
            .iter()
            .all(|r| r.line_source == LineSource::Realized));
    }

    #[test]
    fn test_training_slice_never_sees_same_day_or_later_games() {
        // Four teams, two games per date; both same-date games must train on
        // the same earlier-days-only slice.
        let log = GameLog::from_unordered(vec![
            game(1, "Boston Celtics", "Miami Heat", 110, 100),
            game(1, "Denver Nuggets", "Utah Jazz", 120, 110),
            game(3, "Miami Heat", "Boston Celtics", 104, 108),
            game(3, "Utah Jazz", "Denver Nuggets", 99, 118),
            game(5, "Boston Celtics", "Denver Nuggets", 115, 113),
            game(5, "Miami Heat", "Utah Jazz", 97, 102),
        ]);
        let engine = BacktestEngine::new(config(GradingMode::RealizedTotal, 2));
        let report = engine.run(&log, &LineBook::new()).unwrap();

        let trained_on: Vec<usize> = report.records.iter().map(|r| r.training_games).collect();
        assert_eq!(trained_on, vec![2, 2, 4, 4]);
        assert_eq!(report.summary.skipped_warmup, 2);
    }

    #[test]
    fn test_identical_inputs_reproduce_identical_reports() {
        let engine = BacktestEngine::new(config(GradingMode::MarketLine, 3));
        let first = engine.run(&two_team_log(), &two_team_lines()).unwrap();
        let second = engine.run(&two_team_log(), &two_team_lines()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_brand_new_team_is_skipped_not_graded() {
        let mut games: Vec<Game> = two_team_log().games().to_vec();
        games.push(game(26, "Boston Celtics", "Seattle SuperSonics", 118, 95));
        let log = GameLog::from_unordered(games);

        let engine = BacktestEngine::new(config(GradingMode::RealizedTotal, 3));
        let report = engine.run(&log, &LineBook::new()).unwrap();

        assert_eq!(report.summary.skipped_unknown_team, 1);
        assert_eq!(report.summary.games_tested, 2);
        assert!(report
            .records
            .iter()
            .all(|r| r.away_team != "Seattle SuperSonics"));
    }

    #[test]
    fn test_missing_market_line_falls_back_and_is_counted() {
        let mut book = LineBook::new();
        // Only game 5 has a quote; game 4 grades against the fallback.
        book.insert(d(24), "Boston Celtics", "Miami Heat", 219.0);

        let engine = BacktestEngine::new(config(GradingMode::MarketLine, 3));
        let report = engine.run(&two_team_log(), &book).unwrap();

        let g4 = &report.records[0];
        assert_eq!(g4.line_source, LineSource::Fallback);
        assert_eq!(g4.line, FALLBACK_TOTAL_LINE);
        // 223.5 vs 220.5 → OVER, actual 210 → loss.
        assert_eq!(g4.edge, 3.0);
        assert_eq!(g4.outcome, StepOutcome::Loss);
        assert_eq!(report.summary.fallback_lines, 1);
        assert_eq!(report.summary.games_tested, 2);
    }

    #[test]
    fn test_total_landing_on_the_line_is_a_push() {
        let mut book = LineBook::new();
        // Game 4's realized total is 210; quote it exactly there.
        book.insert(d(23), "Miami Heat", "Boston Celtics", 210.0);
        book.insert(d(24), "Boston Celtics", "Miami Heat", 219.0);

        let engine = BacktestEngine::new(config(GradingMode::MarketLine, 3));
        let report = engine.run(&two_team_log(), &book).unwrap();

        assert_eq!(report.records[0].outcome, StepOutcome::Push);
        assert_eq!(report.summary.pushes, 1);
        assert_eq!(report.summary.losses, 0);
    }

    #[test]
    fn test_min_edge_filters_small_edges_out_of_betting() {
        let config = BacktestConfig {
            min_training_games: 3,
            grading: GradingMode::MarketLine,
            min_edge: 2.0,
            ..BacktestConfig::default()
        };
        let engine = BacktestEngine::new(config);
        let report = engine.run(&two_team_log(), &two_team_lines()).unwrap();

        // Both edges are 1.5, below the threshold: predicted, not bet.
        assert_eq!(report.summary.filtered, 2);
        assert_eq!(report.summary.games_tested, 0);
        assert_relative_eq!(report.summary.total_edge, 0.0);
        assert!(report
            .records
            .iter()
            .all(|r| r.outcome == StepOutcome::Filtered));
    }

    #[test]
    fn test_line_book_matches_case_insensitively() {
        let mut book = LineBook::new();
        book.insert(d(23), "MIAMI HEAT", "boston celtics", 222.0);
        let g = game(23, "Miami Heat", "Boston Celtics", 102, 108);
        assert_eq!(book.line_for(&g), Some(222.0));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_empty_log_produces_empty_report() {
        let engine = BacktestEngine::new(BacktestConfig::default());
        let report = engine
            .run(&GameLog::from_unordered(vec![]), &LineBook::new())
            .unwrap();
        assert_eq!(report.summary.games_total, 0);
        assert_eq!(report.summary.games_tested, 0);
        assert!(report.records.is_empty());
        assert_relative_eq!(report.summary.win_rate(), 0.0);
        assert_relative_eq!(report.summary.avg_edge(), 0.0);
    }
}
