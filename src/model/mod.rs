pub mod edge;
pub mod efficiency;
pub mod game_log;
pub mod predictor;

pub use efficiency::EfficiencyModel;
pub use game_log::{Game, GameLog};

/// League-wide average points per team per game, the fallback for any
/// efficiency figure that cannot be computed from history.
pub const LEAGUE_AVERAGE_POINTS: f64 = 110.0;

/// Flat adjustment added to every predicted total for home-court advantage.
pub const HOME_COURT_BONUS: f64 = 3.5;

/// Tunable model parameters, passed explicitly so parameter sweeps can vary
/// them without touching shared state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    pub league_average: f64,
    pub home_court_bonus: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        ModelParams {
            league_average: LEAGUE_AVERAGE_POINTS,
            home_court_bonus: HOME_COURT_BONUS,
        }
    }
}
