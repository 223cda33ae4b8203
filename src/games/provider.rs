use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::ModelError;
use crate::model::game_log::Game;

/// A match-up that has not finished yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingGame {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
}

/// One day's schedule, split by completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailySlate {
    pub completed: Vec<Game>,
    pub upcoming: Vec<UpcomingGame>,
}

/// Source of completed games and daily schedules.
///
/// Implementations must only return games whose final scores are known;
/// anything still in progress belongs in a slate's `upcoming` list.
#[async_trait]
pub trait GameSource: Send + Sync {
    /// All completed games for the given seasons, in no particular order.
    async fn fetch_completed_games(&self, seasons: &[u16]) -> Result<Vec<Game>, ModelError>;

    /// The schedule for one calendar day.
    async fn fetch_slate(&self, date: NaiveDate) -> Result<DailySlate, ModelError>;

    fn name(&self) -> &str;
}
