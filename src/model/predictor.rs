use crate::error::ModelError;
use crate::model::efficiency::{EfficiencyModel, ResolvedEfficiency, TeamLookup};
use crate::model::ModelParams;

/// How much of one team's side of a prediction came from real data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataCoverage {
    /// Every figure computed from actual games.
    Full,
    /// At least one venue split was filled with the league average.
    PartialFallback,
    /// The team had no history at all; a full league-average row was used.
    LeagueFallback,
}

/// A predicted combined score for one match-up.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub away_team: String,
    pub home_team: String,
    /// Full-precision estimate. Round to 1 decimal for presentation only.
    pub predicted_total: f64,
    pub away_coverage: DataCoverage,
    pub home_coverage: DataCoverage,
}

/// Estimate the combined total for `away_team` playing at `home_team`.
///
/// # Arguments
/// * `model` – efficiency snapshot to read figures from
/// * `away_team` – visiting team name, as it appears in the game log
/// * `home_team` – hosting team name
/// * `params` – league-average fallback and home-court bonus
///
/// # Returns
/// The average of the two matched-up scoring estimates (home offense vs away
/// defense, away offense vs home defense) plus the home-court bonus. Missing
/// figures fall back to `params.league_average` per figure; a team with no
/// history at all uses a full league-average row. Fails with
/// [`ModelError::MissingTeamData`] only when both teams are unknown.
pub fn predict(
    model: &EfficiencyModel,
    away_team: &str,
    home_team: &str,
    params: ModelParams,
) -> Result<Prediction, ModelError> {
    let away = model.lookup(away_team, params.league_average);
    let home = model.lookup(home_team, params.league_average);

    if away.is_unknown() && home.is_unknown() {
        return Err(ModelError::MissingTeamData(format!(
            "{} and {}",
            away_team, home_team
        )));
    }

    let (away_eff, away_coverage) = resolve(&away, params.league_average);
    let (home_eff, home_coverage) = resolve(&home, params.league_average);

    let home_side = home_eff.avg_scored_home + away_eff.avg_allowed_away;
    let away_side = away_eff.avg_scored_away + home_eff.avg_allowed_home;
    let predicted_total = (home_side + away_side) / 2.0 + params.home_court_bonus;

    Ok(Prediction {
        away_team: away_team.to_string(),
        home_team: home_team.to_string(),
        predicted_total,
        away_coverage,
        home_coverage,
    })
}

fn resolve(lookup: &TeamLookup, league_average: f64) -> (ResolvedEfficiency, DataCoverage) {
    match lookup {
        TeamLookup::Found(r) => (*r, DataCoverage::Full),
        TeamLookup::Partial(r) => (*r, DataCoverage::PartialFallback),
        TeamLookup::Unknown => (
            ResolvedEfficiency {
                avg_scored_home: league_average,
                avg_allowed_home: league_average,
                avg_scored_away: league_average,
                avg_allowed_away: league_average,
            },
            DataCoverage::LeagueFallback,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::game_log::Game;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn game(day: u32, home: &str, away: &str, hp: u32, ap: u32) -> Game {
        Game {
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_points: hp,
            away_points: ap,
        }
    }

    #[test]
    fn test_prediction_formula() {
        // Host profile: 112 scored / 107 allowed at home.
        // Visitor profile: 105 scored / 108 allowed on the road.
        let games = vec![
            game(1, "Boston Celtics", "Chicago Bulls", 112, 107),
            game(2, "Charlotte Hornets", "Miami Heat", 108, 105),
        ];
        let model = EfficiencyModel::build(&games);
        let p = predict(&model, "Miami Heat", "Boston Celtics", ModelParams::default()).unwrap();
        // ((112 + 108) + (105 + 107)) / 2 + 3.5
        assert_eq!(p.predicted_total, 219.5);
    }

    #[test]
    fn test_zero_road_games_uses_league_average_not_zero() {
        // Miami has never played on the road; both its road figures must
        // resolve to 110.0.
        let games = vec![
            game(1, "Miami Heat", "Chicago Bulls", 100, 90),
            game(2, "Boston Celtics", "Chicago Bulls", 112, 107),
        ];
        let model = EfficiencyModel::build(&games);
        let p = predict(&model, "Miami Heat", "Boston Celtics", ModelParams::default()).unwrap();
        // ((112 + 110) + (110 + 107)) / 2 + 3.5
        assert_eq!(p.predicted_total, 223.0);
        assert_eq!(p.away_coverage, DataCoverage::PartialFallback);
        // A leaked zero would have produced ((112 + 0) + (0 + 107)) / 2 + 3.5 = 113.0.
        assert!(p.predicted_total > 200.0);
    }

    #[test]
    fn test_single_unknown_team_gets_full_fallback_row() {
        let games = vec![game(1, "Boston Celtics", "Chicago Bulls", 112, 107)];
        let model = EfficiencyModel::build(&games);
        let p = predict(
            &model,
            "Seattle SuperSonics",
            "Boston Celtics",
            ModelParams::default(),
        )
        .unwrap();
        assert_eq!(p.away_coverage, DataCoverage::LeagueFallback);
        // ((112 + 110) + (110 + 107)) / 2 + 3.5
        assert_eq!(p.predicted_total, 223.0);
    }

    #[test]
    fn test_both_teams_unknown_is_an_error() {
        let model = EfficiencyModel::build(&[]);
        let result = predict(
            &model,
            "Miami Heat",
            "Boston Celtics",
            ModelParams::default(),
        );
        assert!(matches!(result, Err(ModelError::MissingTeamData(_))));
    }

    #[test]
    fn test_full_coverage_when_both_teams_have_both_venues() {
        let games = vec![
            game(1, "Boston Celtics", "Miami Heat", 112, 104),
            game(2, "Miami Heat", "Boston Celtics", 101, 99),
        ];
        let model = EfficiencyModel::build(&games);
        let p = predict(&model, "Miami Heat", "Boston Celtics", ModelParams::default()).unwrap();
        assert_eq!(p.away_coverage, DataCoverage::Full);
        assert_eq!(p.home_coverage, DataCoverage::Full);
    }

    #[test]
    fn test_bonus_is_configurable() {
        let games = vec![
            game(1, "Boston Celtics", "Miami Heat", 112, 104),
            game(2, "Miami Heat", "Boston Celtics", 101, 99),
        ];
        let model = EfficiencyModel::build(&games);
        let flat = ModelParams {
            home_court_bonus: 0.0,
            ..ModelParams::default()
        };
        let with_bonus = predict(&model, "Miami Heat", "Boston Celtics", ModelParams::default())
            .unwrap()
            .predicted_total;
        let without = predict(&model, "Miami Heat", "Boston Celtics", flat)
            .unwrap()
            .predicted_total;
        assert_relative_eq!(with_bonus - without, 3.5);
    }
}
