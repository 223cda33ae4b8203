use std::fmt;

/// Which side of the total, if any, the model recommends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    /// The combined score should beat the line.
    Over,
    /// The combined score should stay under the line.
    Under,
    /// Rounded edge is exactly zero; neither side has value.
    NoBet,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Recommendation::Over => "OVER",
            Recommendation::Under => "UNDER",
            Recommendation::NoBet => "NO BET",
        };
        f.write_str(s)
    }
}

/// Outcome of comparing a prediction against a quoted line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeResult {
    pub predicted_total: f64,
    pub market_line: f64,
    /// Signed difference, rounded to 2 decimals.
    pub edge: f64,
    pub recommendation: Recommendation,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Compare a predicted total to the market line.
///
/// Pure and total: any pair of finite inputs produces a result. The
/// recommendation follows the sign of the rounded edge, so a hairline
/// difference that rounds to 0.00 is a no-bet.
pub fn evaluate(predicted_total: f64, market_line: f64) -> EdgeResult {
    let edge = round2(predicted_total - market_line);
    let recommendation = if edge > 0.0 {
        Recommendation::Over
    } else if edge < 0.0 {
        Recommendation::Under
    } else {
        Recommendation::NoBet
    };
    EdgeResult {
        predicted_total,
        market_line,
        edge,
        recommendation,
    }
}
