use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::debug;

use super::provider::{OddsSource, TotalLine};
use crate::error::ModelError;

const SOURCE: &str = "the-odds-api";

/// Totals-market odds provider backed by The Odds API.
/// Docs: <https://the-odds-api.com/liveapi/guides/v4/>
pub struct TheOddsApi {
    http: Client,
    api_key: Option<String>,
    /// Base URL for overriding in tests
    base_url: String,
    /// Preferred bookmaker, matched as a case-insensitive title substring.
    bookmaker: String,
    region: String,
}

impl TheOddsApi {
    pub fn new(
        api_key: Option<&str>,
        base_url: Option<&str>,
        bookmaker: &str,
        region: &str,
    ) -> Result<Self, ModelError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                ModelError::source_unavailable(SOURCE, format!("failed to build HTTP client: {}", e))
            })?;
        Ok(TheOddsApi {
            http,
            api_key: api_key.map(str::to_string),
            base_url: base_url
                .unwrap_or("https://api.the-odds-api.com/v4")
                .to_string(),
            bookmaker: bookmaker.to_string(),
            region: region.to_string(),
        })
    }
}

#[async_trait]
impl OddsSource for TheOddsApi {
    fn name(&self) -> &str {
        SOURCE
    }

    async fn fetch_total_lines(&self) -> Result<Vec<TotalLine>, ModelError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ModelError::source_unavailable(SOURCE, "no API key configured"))?;

        let url = format!(
            "{}/sports/basketball_nba/odds?apiKey={}&regions={}&markets=totals&oddsFormat=decimal",
            self.base_url, api_key, self.region
        );
        debug!("Fetching NBA totals lines from The Odds API");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ModelError::source_unavailable(SOURCE, e))?;

        if let Some(remaining) = resp
            .headers()
            .get("x-requests-remaining")
            .and_then(|v| v.to_str().ok())
        {
            debug!("The Odds API requests remaining: {}", remaining);
        }

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

        Ok(parse_totals_response(&raw, &self.bookmaker))
    }
}

/// Extract one totals line per event.
///
/// Prefers the named bookmaker; falls back to the first bookmaker quoting a
/// totals market so thin slates still produce lines. Events with no totals
/// market anywhere are dropped.
fn parse_totals_response(raw: &serde_json::Value, preferred_book: &str) -> Vec<TotalLine> {
    let events = match raw.as_array() {
        Some(a) => a,
        None => return vec![],
    };

    events
        .iter()
        .filter_map(|ev| {
            let home_team = ev["home_team"].as_str()?.to_string();
            let away_team = ev["away_team"].as_str()?.to_string();
            let commence_time = ev["commence_time"]
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())?
                .with_timezone(&Utc);

            let bookmakers = ev["bookmakers"].as_array()?;
            let (bookmaker, total) = pick_total(bookmakers, preferred_book)?;

            Some(TotalLine {
                commence_time,
                home_team,
                away_team,
                total,
                bookmaker,
            })
        })
        .collect()
}

fn pick_total(bookmakers: &[serde_json::Value], preferred: &str) -> Option<(String, f64)> {
    let preferred_lower = preferred.to_lowercase();
    bookmakers
        .iter()
        .find(|bm| {
            bm["title"]
                .as_str()
                .map(|t| t.to_lowercase().contains(&preferred_lower))
                .unwrap_or(false)
        })
        .and_then(totals_quote)
        .or_else(|| bookmakers.iter().find_map(totals_quote))
}

/// One bookmaker's totals quote: the `point` of its Over outcome.
fn totals_quote(bm: &serde_json::Value) -> Option<(String, f64)> {
    let title = bm["title"].as_str().unwrap_or("unknown").to_string();
    let markets = bm["markets"].as_array()?;
    let totals = markets
        .iter()
        .find(|m| m["key"].as_str() == Some("totals"))?;
    let over = totals["outcomes"]
        .as_array()?
        .iter()
        .find(|o| o["name"].as_str() == Some("Over"))?;
    Some((title, over["point"].as_f64()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> serde_json::Value {
        json!([
            {
                "commence_time": "2025-01-10T00:10:00Z",
                "home_team": "Boston Celtics",
                "away_team": "Miami Heat",
                "bookmakers": [
                    {
                        "title": "FanDuel",
                        "markets": [
                            {"key": "totals", "outcomes": [
                                {"name": "Over", "point": 221.5, "price": 1.91},
                                {"name": "Under", "point": 221.5, "price": 1.91}
                            ]}
                        ]
                    },
                    {
                        "title": "DraftKings",
                        "markets": [
                            {"key": "totals", "outcomes": [
                                {"name": "Over", "point": 220.5, "price": 1.87},
                                {"name": "Under", "point": 220.5, "price": 1.95}
                            ]}
                        ]
                    }
                ]
            },
            {
                "commence_time": "2025-01-10T02:40:00Z",
                "home_team": "Los Angeles Lakers",
                "away_team": "Phoenix Suns",
                "bookmakers": [
                    {
                        "title": "FanDuel",
                        "markets": [
                            {"key": "h2h", "outcomes": [
                                {"name": "Los Angeles Lakers", "price": 1.65},
                                {"name": "Phoenix Suns", "price": 2.30}
                            ]}
                        ]
                    }
                ]
            }
        ])
    }

    #[test]
    fn test_preferred_bookmaker_wins() {
        let lines = parse_totals_response(&fixture(), "draftkings");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].total, 220.5);
        assert_eq!(lines[0].bookmaker, "DraftKings");
        assert_eq!(lines[0].home_team, "Boston Celtics");
    }

    #[test]
    fn test_falls_back_to_first_bookmaker_with_totals() {
        let lines = parse_totals_response(&fixture(), "bet365");
        assert_eq!(lines[0].total, 221.5);
        assert_eq!(lines[0].bookmaker, "FanDuel");
    }

    #[test]
    fn test_event_without_totals_market_is_dropped() {
        let lines = parse_totals_response(&fixture(), "draftkings");
        assert!(lines.iter().all(|l| l.home_team != "Los Angeles Lakers"));
    }

    #[test]
    fn test_non_array_response_is_empty() {
        let lines = parse_totals_response(&json!({"message": "invalid key"}), "draftkings");
        assert!(lines.is_empty());
    }
}
