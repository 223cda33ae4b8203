pub mod engine;
pub mod report;
pub mod sweep;

pub use engine::{BacktestConfig, BacktestEngine, GradingMode, LineBook};
