//! Venue-split team efficiency aggregation.
//!
//! Folds a completed-game history into per-team scoring profiles, kept
//! separate by venue: how a team scores and defends at home is a different
//! signal from how it travels. Four figures per team:
//!
//! - `avg_scored_home` / `avg_allowed_home` — mean points for/against as host
//! - `avg_scored_away` / `avg_allowed_away` — mean points for/against as visitor
//!
//! A split with zero games is `None`, not `0.0` — an absent average must
//! never be mistaken for a zero-point offense. Missing figures resolve to a
//! league-average fallback only at the point of use, through
//! [`EfficiencyModel::lookup`], which tags the result so callers can audit
//! how much of a prediction rests on fallbacks.

use std::collections::HashMap;

use crate::model::game_log::Game;

// ── Accumulation ─────────────────────────────────────────────────────────────

/// Running totals for one venue context. Sums stay integral so the final
/// means are exact integer divisions.
#[derive(Debug, Clone, Copy, Default)]
struct VenueAccum {
    points_for: u32,
    points_against: u32,
    games: u32,
}

impl VenueAccum {
    fn add(&mut self, scored: u32, allowed: u32) {
        self.points_for += scored;
        self.points_against += allowed;
        self.games += 1;
    }

    fn mean_for(&self) -> Option<f64> {
        (self.games > 0).then(|| f64::from(self.points_for) / f64::from(self.games))
    }

    fn mean_against(&self) -> Option<f64> {
        (self.games > 0).then(|| f64::from(self.points_against) / f64::from(self.games))
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TeamAccum {
    home: VenueAccum,
    away: VenueAccum,
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Per-team venue-split efficiency figures. `None` means the team has not
/// played in that venue context yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamEfficiency {
    pub avg_scored_home: Option<f64>,
    pub avg_allowed_home: Option<f64>,
    pub avg_scored_away: Option<f64>,
    pub avg_allowed_away: Option<f64>,
}

/// Efficiency figures with every gap already filled, ready for arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedEfficiency {
    pub avg_scored_home: f64,
    pub avg_allowed_home: f64,
    pub avg_scored_away: f64,
    pub avg_allowed_away: f64,
}

/// Result of looking a team up in a model snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TeamLookup {
    /// All four figures computed from real games.
    Found(ResolvedEfficiency),
    /// The team exists but at least one figure was filled with the league
    /// average.
    Partial(ResolvedEfficiency),
    /// No games at all for this team in the training slice.
    Unknown,
}

impl TeamLookup {
    pub fn is_unknown(&self) -> bool {
        matches!(self, TeamLookup::Unknown)
    }
}

/// An immutable snapshot of per-team efficiency built from one training
/// slice.
///
/// Snapshots are cheap to rebuild and never updated in place: callers
/// wanting newer data build a new one from a longer slice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EfficiencyModel {
    teams: HashMap<String, TeamEfficiency>,
}

impl EfficiencyModel {
    /// Fold a slice of completed games into a snapshot.
    ///
    /// An empty slice yields an empty model; a team appears as soon as it
    /// has played a single game in either venue.
    pub fn build(games: &[Game]) -> Self {
        let mut accums: HashMap<String, TeamAccum> = HashMap::new();
        for g in games {
            accums
                .entry(g.home_team.clone())
                .or_default()
                .home
                .add(g.home_points, g.away_points);
            accums
                .entry(g.away_team.clone())
                .or_default()
                .away
                .add(g.away_points, g.home_points);
        }

        let teams = accums
            .into_iter()
            .map(|(team, acc)| {
                (
                    team,
                    TeamEfficiency {
                        avg_scored_home: acc.home.mean_for(),
                        avg_allowed_home: acc.home.mean_against(),
                        avg_scored_away: acc.away.mean_for(),
                        avg_allowed_away: acc.away.mean_against(),
                    },
                )
            })
            .collect();

        EfficiencyModel { teams }
    }

    /// Whether the team played at least one game in the training slice.
    pub fn contains(&self, team: &str) -> bool {
        self.teams.contains_key(team)
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Raw figures for a team, gaps included.
    pub fn efficiency(&self, team: &str) -> Option<&TeamEfficiency> {
        self.teams.get(team)
    }

    /// Look a team up, filling any missing split with `league_average`.
    pub fn lookup(&self, team: &str, league_average: f64) -> TeamLookup {
        let eff = match self.teams.get(team) {
            Some(e) => e,
            None => return TeamLookup::Unknown,
        };

        let complete = eff.avg_scored_home.is_some()
            && eff.avg_allowed_home.is_some()
            && eff.avg_scored_away.is_some()
            && eff.avg_allowed_away.is_some();

        let resolved = ResolvedEfficiency {
            avg_scored_home: eff.avg_scored_home.unwrap_or(league_average),
            avg_allowed_home: eff.avg_allowed_home.unwrap_or(league_average),
            avg_scored_away: eff.avg_scored_away.unwrap_or(league_average),
            avg_allowed_away: eff.avg_allowed_away.unwrap_or(league_average),
        };

        if complete {
            TeamLookup::Found(resolved)
        } else {
            TeamLookup::Partial(resolved)
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
