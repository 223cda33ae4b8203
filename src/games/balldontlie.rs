use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::future::join_all;
use rand::Rng;
use reqwest::Client;
use tracing::debug;

use super::provider::{DailySlate, GameSource, UpcomingGame};
use crate::error::ModelError;
use crate::model::game_log::Game;

const SOURCE: &str = "balldontlie";

/// Base delay between paginated requests; the free tier throttles bursts.
const PAGE_DELAY_MS: u64 = 600;

/// Games provider backed by the balldontlie NBA API.
/// Docs: <https://docs.balldontlie.io>
pub struct BallDontLie {
    http: Client,
    api_key: Option<String>,
    /// Base URL for overriding in tests
    base_url: String,
}

impl BallDontLie {
    pub fn new(api_key: Option<&str>, base_url: Option<&str>) -> Result<Self, ModelError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                ModelError::source_unavailable(SOURCE, format!("failed to build HTTP client: {}", e))
            })?;
        Ok(BallDontLie {
            http,
            api_key: api_key.map(str::to_string),
            base_url: base_url
                .unwrap_or("https://api.balldontlie.io/v1")
                .to_string(),
        })
    }

    async fn fetch_page(
        &self,
        query: &str,
        cursor: Option<u64>,
    ) -> Result<(serde_json::Value, Option<u64>), ModelError> {
        let mut url = format!("{}/games?per_page=100&{}", self.base_url, query);
        if let Some(c) = cursor {
            url.push_str(&format!("&cursor={}", c));
        }
        debug!("Fetching games page from {}", url);

        let mut req = self.http.get(&url);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ModelError::source_unavailable(SOURCE, e))?;

        if !resp.status().is_success() {
            return Err(ModelError::source_unavailable(
                SOURCE,
                format!("HTTP {}", resp.status()),
            ));
        }

        let raw: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ModelError::source_unavailable(SOURCE, e))?;
        let next = raw["meta"]["next_cursor"].as_u64();
        Ok((raw, next))
    }

    /// Every completed game of one season, following cursor pagination with
    /// a jittered delay between pages.
    async fn fetch_season(&self, season: u16) -> Result<Vec<Game>, ModelError> {
        let mut games = Vec::new();
        let mut cursor = None;
        loop {
            let (raw, next) = self
                .fetch_page(&format!("seasons[]={}", season), cursor)
                .await?;
            games.extend(parse_games_page(&raw).completed);
            match next {
                Some(c) => {
                    cursor = Some(c);
                    let jitter = rand::thread_rng().gen_range(0..200);
                    tokio::time::sleep(Duration::from_millis(PAGE_DELAY_MS + jitter)).await;
                }
                None => break,
            }
        }
        debug!("Season {}: {} completed games", season, games.len());
        Ok(games)
    }
}

#[async_trait]
impl GameSource for BallDontLie {
    fn name(&self) -> &str {
        SOURCE
    }

    async fn fetch_completed_games(&self, seasons: &[u16]) -> Result<Vec<Game>, ModelError> {
        let fetches = seasons.iter().map(|&s| self.fetch_season(s));
        let mut games = Vec::new();
        for result in join_all(fetches).await {
            games.extend(result?);
        }
        debug!(
            "Fetched {} completed games across {} season(s)",
            games.len(),
            seasons.len()
        );
        Ok(games)
    }

    async fn fetch_slate(&self, date: NaiveDate) -> Result<DailySlate, ModelError> {
        let (raw, _) = self.fetch_page(&format!("dates[]={}", date), None).await?;
        Ok(parse_games_page(&raw))
    }
}

/// Parse one `/games` response page. A missing data array yields an empty
/// slate; malformed records are skipped.
///
/// A record only counts as completed when its status is Final and both
/// scores are present and non-zero — null or zeroed scores mean the game has
/// not finished and must not enter training data.
fn parse_games_page(raw: &serde_json::Value) -> DailySlate {
    let mut slate = DailySlate::default();
    let data = match raw["data"].as_array() {
        Some(a) => a,
        None => return slate,
    };

    for rec in data {
        let date = match rec["date"].as_str().and_then(parse_game_date) {
            Some(d) => d,
            None => continue,
        };
        let home_team = match rec["home_team"]["full_name"].as_str() {
            Some(s) => s.to_string(),
            None => continue,
        };
        let away_team = match rec["visitor_team"]["full_name"].as_str() {
            Some(s) => s.to_string(),
            None => continue,
        };

        let home_points = score_of(&rec["home_team_score"]);
        let away_points = score_of(&rec["visitor_team_score"]);
        let finished = rec["status"].as_str() == Some("Final");

        match (home_points, away_points) {
            (Some(hp), Some(ap)) if finished && hp + ap > 0 => slate.completed.push(Game {
                date,
                home_team,
                away_team,
                home_points: hp,
                away_points: ap,
            }),
            _ => slate.upcoming.push(UpcomingGame {
                date,
                home_team,
                away_team,
            }),
        }
    }

    slate
}

/// Dates arrive either bare (`2024-01-15`) or as an ISO timestamp.
fn parse_game_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok()
}

fn score_of(v: &serde_json::Value) -> Option<u32> {
    v.as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page() -> serde_json::Value {
        json!({
            "data": [
                {
                    "date": "2025-01-10T00:00:00.000Z",
                    "status": "Final",
                    "home_team": {"full_name": "Boston Celtics"},
                    "visitor_team": {"full_name": "Miami Heat"},
                    "home_team_score": 112,
                    "visitor_team_score": 104
                },
                {
                    "date": "2025-01-10",
                    "status": "2nd Qtr",
                    "home_team": {"full_name": "Denver Nuggets"},
                    "visitor_team": {"full_name": "Utah Jazz"},
                    "home_team_score": 56,
                    "visitor_team_score": 60
                },
                {
                    "date": "2025-01-10",
                    "status": "7:30 pm ET",
                    "home_team": {"full_name": "Phoenix Suns"},
                    "visitor_team": {"full_name": "Dallas Mavericks"},
                    "home_team_score": null,
                    "visitor_team_score": null
                }
            ],
            "meta": {"next_cursor": 25}
        })
    }

    #[test]
    fn test_parse_splits_completed_and_upcoming() {
        let slate = parse_games_page(&page());
        assert_eq!(slate.completed.len(), 1);
        assert_eq!(slate.completed[0].home_team, "Boston Celtics");
        assert_eq!(slate.completed[0].total(), 216);
        assert_eq!(slate.upcoming.len(), 2);
    }

    #[test]
    fn test_null_scores_never_become_completed_games() {
        let slate = parse_games_page(&page());
        assert!(slate
            .completed
            .iter()
            .all(|g| g.home_team != "Phoenix Suns"));
        assert!(slate
            .upcoming
            .iter()
            .any(|g| g.home_team == "Phoenix Suns"));
    }

    #[test]
    fn test_in_progress_scores_stay_out_of_training_data() {
        let slate = parse_games_page(&page());
        assert!(slate
            .completed
            .iter()
            .all(|g| g.home_team != "Denver Nuggets"));
    }

    #[test]
    fn test_missing_data_array_is_an_empty_slate() {
        let slate = parse_games_page(&json!({"error": "rate limited"}));
        assert!(slate.completed.is_empty());
        assert!(slate.upcoming.is_empty());
    }

    #[test]
    fn test_date_parsing_accepts_both_shapes() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 10);
        assert_eq!(parse_game_date("2025-01-10T00:00:00.000Z"), expected);
        assert_eq!(parse_game_date("2025-01-10"), expected);
        assert_eq!(parse_game_date("bad"), None);
    }

    #[test]
    fn test_string_scores_are_accepted() {
        assert_eq!(score_of(&json!("112")), Some(112));
        assert_eq!(score_of(&json!(112)), Some(112));
        assert_eq!(score_of(&json!(null)), None);
    }

    #[test]
    fn test_out_of_range_scores_are_rejected_not_truncated() {
        assert_eq!(score_of(&json!(u64::from(u32::MAX) + 1)), None);
        assert_eq!(score_of(&json!(u64::MAX)), None);
    }
}
