use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ModelError;

/// A quoted totals line for an upcoming game.
#[derive(Debug, Clone, PartialEq)]
pub struct TotalLine {
    pub commence_time: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    /// The quoted combined-score line.
    pub total: f64,
    pub bookmaker: String,
}

/// Source of market totals lines.
#[async_trait]
pub trait OddsSource: Send + Sync {
    async fn fetch_total_lines(&self) -> Result<Vec<TotalLine>, ModelError>;

    fn name(&self) -> &str;
}
