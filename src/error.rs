use thiserror::Error;

/// Failure taxonomy for the model core.
///
/// Everything under `model/`, `backtest/`, `games/` and `odds/` returns this
/// so callers can tell a recoverable data gap from a structurally invalid
/// input; the binary wraps it in `anyhow` at the boundary.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A team has zero games in the active training slice. Recoverable via
    /// the league-average fallback except where nothing is left to compute
    /// with; in backtests it becomes a skip counter, never a loss.
    #[error("no game history for {0}")]
    MissingTeamData(String),

    /// Training data below the warm-up threshold. Backtest steps hitting this
    /// are skipped and counted.
    #[error("insufficient history: {available} prior game(s), {required} required")]
    InsufficientHistory { required: usize, available: usize },

    /// A remote collaborator (games API, odds API, input file) failed. The
    /// caller keeps going on whatever data it already has.
    #[error("external source '{source_name}' unavailable: {reason}")]
    ExternalSourceUnavailable { source_name: String, reason: String },

    /// Structurally invalid input: out-of-order dates, malformed records.
    /// The only unrecoverable class.
    #[error("invalid game log: {0}")]
    InvalidGameLog(String),
}

impl ModelError {
    /// Wrap a collaborator failure.
    pub fn source_unavailable(source: &str, reason: impl std::fmt::Display) -> Self {
        ModelError::ExternalSourceUnavailable {
            source_name: source.to_string(),
            reason: reason.to_string(),
        }
    }
}
