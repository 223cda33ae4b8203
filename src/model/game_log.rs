use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// One completed game. Scores are unsigned so a negative total is
/// unrepresentable; the combined total is always derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_points: u32,
    pub away_points: u32,
}

impl Game {
    /// Combined final score of both teams.
    pub fn total(&self) -> u32 {
        self.home_points + self.away_points
    }
}

/// An immutable, date-ascending record of completed games.
///
/// Backtests take sub-slices of this log; nothing mutates it after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameLog {
    games: Vec<Game>,
}

impl GameLog {
    /// Build a log from games already in chronological order.
    ///
    /// Fails with [`ModelError::InvalidGameLog`] if any game's date precedes
    /// the one before it.
    pub fn new(games: Vec<Game>) -> Result<Self, ModelError> {
        for pair in games.windows(2) {
            if pair[1].date < pair[0].date {
                return Err(ModelError::InvalidGameLog(format!(
                    "games out of order: {} after {}",
                    pair[1].date, pair[0].date
                )));
            }
        }
        Ok(GameLog { games })
    }

    /// Build a log from games in arbitrary order. The sort is stable, so
    /// same-day games keep their ingestion order.
    pub fn from_unordered(mut games: Vec<Game>) -> Self {
        games.sort_by_key(|g| g.date);
        GameLog { games }
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    /// Games played strictly before `date`. Same-day games are excluded:
    /// when grading a game the model may only see earlier days.
    pub fn before(&self, date: NaiveDate) -> &[Game] {
        let end = self.games.partition_point(|g| g.date < date);
        &self.games[..end]
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}
