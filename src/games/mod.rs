pub mod balldontlie;
pub mod provider;

pub use balldontlie::BallDontLie;
pub use provider::{DailySlate, GameSource, UpcomingGame};

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::backtest::engine::LineBook;
use crate::error::ModelError;
use crate::model::game_log::{Game, GameLog};

/// One row of a flat games file: a completed game plus an optional
/// sportsbook total quoted for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameFileRecord {
    pub date: NaiveDate,
    pub home: String,
    pub away: String,
    pub home_pts: u32,
    pub away_pts: u32,
    #[serde(default)]
    pub line: Option<f64>,
}

/// Load games (and any quoted lines) from a flat JSON file.
pub fn load_games_file(path: &Path) -> Result<(GameLog, LineBook), ModelError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ModelError::source_unavailable("games file", format!("{}: {}", path.display(), e))
    })?;
    parse_games_json(&text)
}

/// Parse the flat-file format: a JSON array of [`GameFileRecord`]. Rows
/// carrying a `line` also populate the returned [`LineBook`].
pub fn parse_games_json(text: &str) -> Result<(GameLog, LineBook), ModelError> {
    let records: Vec<GameFileRecord> = serde_json::from_str(text)
        .map_err(|e| ModelError::InvalidGameLog(format!("malformed games file: {}", e)))?;

    let mut lines = LineBook::new();
    let mut games = Vec::with_capacity(records.len());
    for rec in records {
        if let Some(line) = rec.line {
            lines.insert(rec.date, &rec.home, &rec.away, line);
        }
        games.push(Game {
            date: rec.date,
            home_team: rec.home,
            away_team: rec.away,
            home_points: rec.home_pts,
            away_points: rec.away_pts,
        });
    }

    Ok((GameLog::from_unordered(games), lines))
}
